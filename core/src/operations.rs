use rand::{Rng, RngCore};

use crate::constants::{FLAG, SPRITE_HEIGHT, SPRITE_SHEET_START};
use crate::error::Error;
use crate::keypad::Keypad;
use crate::opcode::Opcode;
use crate::state::State;

/// What an operation may read or use besides the machine state.
pub struct Context<'a> {
    pub keypad: &'a Keypad,
    pub rng: &'a mut dyn RngCore,
}

/// Executes one operation against `state`, returning the state it leaves behind.
///
/// Every handler leaves the pc pointing at the instruction *before* the one
/// that should run next; the interpreter steps past it once the handler
/// returns. Jumping to `addr` therefore sets `pc = addr - 2`, and skipping the
/// next instruction adds 2.
pub type Handler =
    fn(op: &dyn Opcode, state: &State, ctx: &mut Context<'_>) -> Result<State, Error>;

/// The pc that makes the next executed instruction `addr`.
fn land_on(addr: u16) -> u16 {
    addr.wrapping_sub(0x2)
}

/// The pc that skips the next instruction when `condition` holds.
fn skip_if(state: &State, condition: bool) -> u16 {
    if condition {
        state.pc.wrapping_add(0x2)
    } else {
        state.pc
    }
}

/// clear
pub fn clr(_op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let mut state = *state;
    state.display.clear();
    state.draw_flag = true;
    Ok(state)
}

/// PC = STACK.pop()
pub fn rts(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let mut state = *state;
    // The return address is the CALL itself, which the interpreter then steps past
    state.pc = state.pop(op.bits())?;
    Ok(state)
}

/// PC = addr
pub fn jump(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    Ok(State {
        pc: land_on(op.addr()),
        ..*state
    })
}

/// STACK.push(PC); PC = addr
pub fn call(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let mut state = *state;
    state.push(op.bits())?;
    state.pc = land_on(op.addr());
    Ok(state)
}

/// if Vx == kk then pc += 2
pub fn ske(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let pc = skip_if(state, state.v[op.x()] == op.kk());
    Ok(State { pc, ..*state })
}

/// if Vx != kk then pc += 2
pub fn skne(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let pc = skip_if(state, state.v[op.x()] != op.kk());
    Ok(State { pc, ..*state })
}

/// if Vx == Vy then pc += 2
pub fn skre(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let pc = skip_if(state, state.v[op.x()] == state.v[op.y()]);
    Ok(State { pc, ..*state })
}

/// Vx = kk
pub fn load(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let mut v = state.v;
    v[op.x()] = op.kk();
    Ok(State { v, ..*state })
}

/// Vx += kk
/// Add kk to Vx; allow for overflow but implicitly drop it
pub fn add(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let mut v = state.v;
    v[op.x()] = v[op.x()].wrapping_add(op.kk());
    Ok(State { v, ..*state })
}

/// Vx = Vy
pub fn mv(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let mut v = state.v;
    v[op.x()] = v[op.y()];
    Ok(State { v, ..*state })
}

/// Vx |= Vy
pub fn or(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let mut v = state.v;
    v[op.x()] |= v[op.y()];
    Ok(State { v, ..*state })
}

/// Vx &= Vy
pub fn and(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let mut v = state.v;
    v[op.x()] &= v[op.y()];
    Ok(State { v, ..*state })
}

/// Vx ^= Vy
pub fn xor(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let mut v = state.v;
    v[op.x()] ^= v[op.y()];
    Ok(State { v, ..*state })
}

/// Vx += Vy; VF = overflow
/// The flag is written last, so ADD VF, Vy leaves only the carry in VF
pub fn addr(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let (res, over) = state.v[op.x()].overflowing_add(state.v[op.y()]);
    let mut v = state.v;
    v[op.x()] = res;
    v[FLAG] = u8::from(over);
    Ok(State { v, ..*state })
}

/// Vx -= Vy; VF = Vx > Vy
pub fn sub(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let (vx, vy) = (state.v[op.x()], state.v[op.y()]);
    let mut v = state.v;
    v[FLAG] = u8::from(vx > vy);
    v[op.x()] = vx.wrapping_sub(vy);
    Ok(State { v, ..*state })
}

/// Vx >>= 1; VF = lsb
pub fn shr(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let vx = state.v[op.x()];
    let mut v = state.v;
    v[FLAG] = vx & 0x1;
    v[op.x()] = vx >> 1;
    Ok(State { v, ..*state })
}

/// Vx = Vy - Vx; VF = Vx > Vy
pub fn subn(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let (vx, vy) = (state.v[op.x()], state.v[op.y()]);
    let mut v = state.v;
    v[FLAG] = u8::from(vx > vy);
    v[op.x()] = vy.wrapping_sub(vx);
    Ok(State { v, ..*state })
}

/// Vx <<= 1; VF = msb
pub fn shl(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let vx = state.v[op.x()];
    let mut v = state.v;
    v[FLAG] = (vx & 0x80) >> 7;
    v[op.x()] = vx << 1;
    Ok(State { v, ..*state })
}

/// if Vx != Vy then pc +=2
pub fn skrne(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let pc = skip_if(state, state.v[op.x()] != state.v[op.y()]);
    Ok(State { pc, ..*state })
}

/// I = addr
pub fn loadi(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    Ok(State {
        i: op.addr(),
        ..*state
    })
}

/// PC = V0 + addr
pub fn jumpi(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    Ok(State {
        pc: land_on(u16::from(state.v[0x0]) + op.addr()),
        ..*state
    })
}

/// Vx = rand_byte & kk
pub fn rnd(op: &dyn Opcode, state: &State, ctx: &mut Context) -> Result<State, Error> {
    let rand_byte: u8 = ctx.rng.gen();
    let mut v = state.v;
    v[op.x()] = rand_byte & op.kk();
    Ok(State { v, ..*state })
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs a sprite from memory i..i+n at position x, y on the display.
/// Sets VF if any pixels were erased
pub fn draw(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let sprite = state.span(state.i, usize::from(op.n()), Some(op.bits()))?;
    let mut state = *state;
    let (x, y) = (state.v[op.x()], state.v[op.y()]);
    let collision = state
        .display
        .draw(usize::from(x), usize::from(y), &state.memory[sprite]);
    state.v[FLAG] = u8::from(collision);
    state.draw_flag = true;
    Ok(state)
}

/// if Vx.pressed then pc += 2
pub fn skpr(op: &dyn Opcode, state: &State, ctx: &mut Context) -> Result<State, Error> {
    let pc = skip_if(state, ctx.keypad.is_pressed(state.v[op.x()]));
    Ok(State { pc, ..*state })
}

/// if !Vx.pressed then pc += 2
pub fn skup(op: &dyn Opcode, state: &State, ctx: &mut Context) -> Result<State, Error> {
    let pc = skip_if(state, !ctx.keypad.is_pressed(state.v[op.x()]));
    Ok(State { pc, ..*state })
}

/// Vx = DT
pub fn moved(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let mut v = state.v;
    v[op.x()] = state.delay_timer;
    Ok(State { v, ..*state })
}

/// await keypress for Vx
pub fn keyd(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    Ok(State {
        register_needing_key: Some(op.x()),
        ..*state
    })
}

/// DT = Vx
pub fn loads(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    Ok(State {
        delay_timer: state.v[op.x()],
        ..*state
    })
}

/// ST = Vx
pub fn ld(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    Ok(State {
        sound_timer: state.v[op.x()],
        ..*state
    })
}

/// I += Vx
pub fn addi(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    Ok(State {
        i: state.i.wrapping_add(u16::from(state.v[op.x()])),
        ..*state
    })
}

/// I = Vx * 5
/// Set I to the memory address of the glyph for Vx
/// See constants::SPRITE_SHEET for more details
pub fn ldspr(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    Ok(State {
        i: SPRITE_SHEET_START + u16::from(state.v[op.x()]) * SPRITE_HEIGHT,
        ..*state
    })
}

/// mem[I..I+3] = bcd(Vx)
/// Store BCD repr of Vx in memory starting at address i
pub fn bcd(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let vx = state.v[op.x()];
    let target = state.span(state.i, 3, Some(op.bits()))?;
    let mut memory = state.memory;
    memory[target].copy_from_slice(&[vx / 100 % 10, vx / 10 % 10, vx % 10]);
    Ok(State { memory, ..*state })
}

/// mem[I..=I+x] = V0..=Vx
/// Fill memory starting at address i with V0..=Vx
pub fn stor(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let target = state.span(state.i, op.x() + 1, Some(op.bits()))?;
    let mut memory = state.memory;
    memory[target].copy_from_slice(&state.v[0x0..=op.x()]);
    Ok(State { memory, ..*state })
}

/// V0..=Vx = mem[I..=I+x]
/// Fill V0..=Vx with memory starting at address i
pub fn read(op: &dyn Opcode, state: &State, _ctx: &mut Context) -> Result<State, Error> {
    let source = state.span(state.i, op.x() + 1, Some(op.bits()))?;
    let mut v = state.v;
    v[0x0..=op.x()].copy_from_slice(&state.memory[source]);
    Ok(State { v, ..*state })
}
