use crate::constants::KEY_COUNT;

/// # Keypad
/// Pressed status of the 16 keys of the hexadecimal keypad, addressed by key
/// code 0..F.
///
/// Only the host changes it. The interpreter reads it when skipping on key
/// state and when waiting for a key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Keypad {
    pressed: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Keypad {
            pressed: [false; KEY_COUNT],
        }
    }

    /// Set the pressed status of `key`.
    ///
    /// Returns false, leaving the keypad untouched, if `key` isn't a key code.
    pub fn set_pressed(&mut self, key: u8, pressed: bool) -> bool {
        match self.pressed.get_mut(usize::from(key)) {
            Some(slot) => {
                *slot = pressed;
                true
            }
            None => false,
        }
    }

    /// Unset the pressed status of `key`.
    pub fn set_released(&mut self, key: u8) -> bool {
        self.set_pressed(key, false)
    }

    /// Whether `key` is held. Values that aren't key codes are never held.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.pressed.get(usize::from(key)).copied().unwrap_or(false)
    }

    /// The lowest held key code, if any key is held.
    pub fn lowest_pressed(&self) -> Option<u8> {
        self.pressed
            .iter()
            .position(|&pressed| pressed)
            .map(|key| key as u8)
    }
}
