use rand::Rng;

use crate::constants::{SPRITE_HEIGHT, SPRITE_SHEET_START};
use crate::error::CpuError;
use crate::state::State;

/// Moves to the next instruction, or past it when `skip` holds
fn skip_if(state: &State, skip: bool) -> State {
    let pc = if skip {
        state.pc + 0x4
    } else {
        state.pc + 0x2
    };
    State { pc, ..*state }
}

/// clear
pub fn clr(state: &State) -> State {
    let mut frame_buffer = state.frame_buffer;
    frame_buffer.clear();
    State {
        pc: state.pc + 0x2,
        frame_buffer,
        draw_flag: true,
        ..*state
    }
}

/// PC = STACK.pop()
/// The popped address is that of the call, so execution resumes just after it
pub fn rts(state: &State) -> Result<State, CpuError> {
    let mut stack = state.stack;
    let call_site = stack.pop()?;
    Ok(State {
        pc: call_site + 0x2,
        stack,
        ..*state
    })
}

/// PC = addr
pub fn jump(state: &State, addr: u16) -> State {
    State { pc: addr, ..*state }
}

/// STACK.push(PC); PC = addr
pub fn call(state: &State, addr: u16) -> Result<State, CpuError> {
    let mut stack = state.stack;
    stack.push(state.pc)?;
    Ok(State {
        pc: addr,
        stack,
        ..*state
    })
}

/// if Vx == nn then pc += 2
pub fn ske(state: &State, x: u8, nn: u8) -> State {
    skip_if(state, state.v[x as usize] == nn)
}

/// if Vx != nn then pc += 2
pub fn skne(state: &State, x: u8, nn: u8) -> State {
    skip_if(state, state.v[x as usize] != nn)
}

/// if Vx == Vy then pc += 2
pub fn skre(state: &State, x: u8, y: u8) -> State {
    skip_if(state, state.v[x as usize] == state.v[y as usize])
}

/// Vx = nn
pub fn load(state: &State, x: u8, nn: u8) -> State {
    let mut v = state.v;
    v[x as usize] = nn;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx += nn
/// Overflow wraps and VF is left alone
pub fn add(state: &State, x: u8, nn: u8) -> State {
    let mut v = state.v;
    v[x as usize] = v[x as usize].wrapping_add(nn);
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx = Vy
pub fn mv(state: &State, x: u8, y: u8) -> State {
    let mut v = state.v;
    v[x as usize] = v[y as usize];
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx |= Vy
pub fn or(state: &State, x: u8, y: u8) -> State {
    let mut v = state.v;
    v[x as usize] |= v[y as usize];
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx &= Vy
pub fn and(state: &State, x: u8, y: u8) -> State {
    let mut v = state.v;
    v[x as usize] &= v[y as usize];
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx ^= Vy
pub fn xor(state: &State, x: u8, y: u8) -> State {
    let mut v = state.v;
    v[x as usize] ^= v[y as usize];
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

// The flag setting operations below write VF after Vx so the flag survives when x is F.

/// Vx += Vy; VF = carry
pub fn addr(state: &State, x: u8, y: u8) -> State {
    let (res, carry) = state.v[x as usize].overflowing_add(state.v[y as usize]);
    let mut v = state.v;
    v[x as usize] = res;
    v[0xF] = carry as u8;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx -= Vy; VF = !borrow
pub fn sub(state: &State, x: u8, y: u8) -> State {
    let (vx, vy) = (state.v[x as usize], state.v[y as usize]);
    let mut v = state.v;
    v[x as usize] = vx.wrapping_sub(vy);
    v[0xF] = (vx >= vy) as u8;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx >>= 1; VF = shifted out bit
pub fn shr(state: &State, x: u8) -> State {
    let vx = state.v[x as usize];
    let mut v = state.v;
    v[x as usize] = vx >> 1;
    v[0xF] = vx & 0x1;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx = Vy - Vx; VF = !borrow
pub fn subn(state: &State, x: u8, y: u8) -> State {
    let (vx, vy) = (state.v[x as usize], state.v[y as usize]);
    let mut v = state.v;
    v[x as usize] = vy.wrapping_sub(vx);
    v[0xF] = (vy >= vx) as u8;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx <<= 1; VF = shifted out bit
pub fn shl(state: &State, x: u8) -> State {
    let vx = state.v[x as usize];
    let mut v = state.v;
    v[x as usize] = vx << 1;
    v[0xF] = vx >> 7;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// if Vx != Vy then pc += 2
pub fn skrne(state: &State, x: u8, y: u8) -> State {
    skip_if(state, state.v[x as usize] != state.v[y as usize])
}

/// I = addr
pub fn loadi(state: &State, addr: u16) -> State {
    State {
        pc: state.pc + 0x2,
        i: addr,
        ..*state
    }
}

/// PC = V0 + addr
pub fn jumpi(state: &State, addr: u16) -> State {
    State {
        pc: u16::from(state.v[0x0]) + addr,
        ..*state
    }
}

/// Vx = rand_byte & nn
pub fn rand(state: &State, x: u8, nn: u8, rng: &mut impl Rng) -> State {
    let rand_byte: u8 = rng.gen();
    let mut v = state.v;
    v[x as usize] = rand_byte & nn;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs a sprite from memory i..i+n at position Vx, Vy on the FrameBuffer with wrapping.
/// Sets VF if any pixels were erased
pub fn draw(state: &State, x: u8, y: u8, n: u8) -> Result<State, CpuError> {
    let sprite = state.memory.slice(state.i, n as usize)?;
    let mut frame_buffer = state.frame_buffer;
    let collision = frame_buffer.draw_sprite(state.v[x as usize], state.v[y as usize], sprite);
    let mut v = state.v;
    v[0xF] = collision as u8;
    Ok(State {
        pc: state.pc + 0x2,
        draw_flag: true,
        v,
        frame_buffer,
        ..*state
    })
}

/// if Vx.pressed then pc += 2
pub fn skpr(state: &State, x: u8) -> State {
    skip_if(state, state.keypad.is_pressed(state.v[x as usize]))
}

/// if !Vx.pressed then pc += 2
pub fn skup(state: &State, x: u8) -> State {
    skip_if(state, !state.keypad.is_pressed(state.v[x as usize]))
}

/// Vx = DT
pub fn moved(state: &State, x: u8) -> State {
    let mut v = state.v;
    v[x as usize] = state.delay_timer;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx = first pressed key
/// Nothing happens while no key is held; the same instruction runs again next cycle
pub fn keyd(state: &State, x: u8) -> Option<State> {
    state.keypad.first_pressed().map(|key| {
        let mut v = state.v;
        v[x as usize] = key;
        State {
            pc: state.pc + 0x2,
            v,
            ..*state
        }
    })
}

/// DT = Vx
pub fn loads(state: &State, x: u8) -> State {
    State {
        pc: state.pc + 0x2,
        delay_timer: state.v[x as usize],
        ..*state
    }
}

/// ST = Vx
pub fn ld(state: &State, x: u8) -> State {
    State {
        pc: state.pc + 0x2,
        sound_timer: state.v[x as usize],
        ..*state
    }
}

/// I += Vx
pub fn addi(state: &State, x: u8) -> State {
    State {
        pc: state.pc + 0x2,
        i: state.i.wrapping_add(u16::from(state.v[x as usize])),
        ..*state
    }
}

/// I = sprite(Vx)
/// Set I to the memory address of the sprite for Vx
/// See constants::SPRITE_SHEET for more details
pub fn ldspr(state: &State, x: u8) -> State {
    State {
        pc: state.pc + 0x2,
        i: SPRITE_SHEET_START + u16::from(state.v[x as usize]) * SPRITE_HEIGHT,
        ..*state
    }
}

/// mem[I..I+3] = bcd(Vx)
/// Store BCD repr of Vx in memory starting at address i
pub fn bcd(state: &State, x: u8) -> Result<State, CpuError> {
    let vx = state.v[x as usize];
    let mut memory = state.memory;
    memory.write_slice(state.i, &[vx / 100, vx / 10 % 10, vx % 10])?;
    Ok(State {
        pc: state.pc + 0x2,
        memory,
        ..*state
    })
}

/// mem[I..=I+x] = V0..=Vx
/// I itself is left unchanged
pub fn stor(state: &State, x: u8) -> Result<State, CpuError> {
    let mut memory = state.memory;
    memory.write_slice(state.i, &state.v[..=x as usize])?;
    Ok(State {
        pc: state.pc + 0x2,
        memory,
        ..*state
    })
}

/// V0..=Vx = mem[I..=I+x]
/// I itself is left unchanged
pub fn read(state: &State, x: u8) -> Result<State, CpuError> {
    let mut v = state.v;
    v[..=x as usize].copy_from_slice(state.memory.slice(state.i, x as usize + 1)?);
    Ok(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}
