//! Conversion between `rdev` keys and virtual-key codes
//!
//! Scripts store keys as Windows virtual-key codes on every platform so a
//! recording made on one machine replays on another.

use rdev::Key;

/// Key table. Where two keys share a code the first entry wins when mapping
/// a code back to a key.
const KEYMAP: &[(Key, u32)] = &[
    (Key::Backspace, 0x08),
    (Key::Tab, 0x09),
    (Key::Return, 0x0D),
    (Key::KpReturn, 0x0D),
    (Key::Pause, 0x13),
    (Key::CapsLock, 0x14),
    (Key::Escape, 0x1B),
    (Key::Space, 0x20),
    (Key::PageUp, 0x21),
    (Key::PageDown, 0x22),
    (Key::End, 0x23),
    (Key::Home, 0x24),
    (Key::LeftArrow, 0x25),
    (Key::UpArrow, 0x26),
    (Key::RightArrow, 0x27),
    (Key::DownArrow, 0x28),
    (Key::PrintScreen, 0x2C),
    (Key::Insert, 0x2D),
    (Key::Delete, 0x2E),
    (Key::Num0, 0x30),
    (Key::Num1, 0x31),
    (Key::Num2, 0x32),
    (Key::Num3, 0x33),
    (Key::Num4, 0x34),
    (Key::Num5, 0x35),
    (Key::Num6, 0x36),
    (Key::Num7, 0x37),
    (Key::Num8, 0x38),
    (Key::Num9, 0x39),
    (Key::KeyA, 0x41),
    (Key::KeyB, 0x42),
    (Key::KeyC, 0x43),
    (Key::KeyD, 0x44),
    (Key::KeyE, 0x45),
    (Key::KeyF, 0x46),
    (Key::KeyG, 0x47),
    (Key::KeyH, 0x48),
    (Key::KeyI, 0x49),
    (Key::KeyJ, 0x4A),
    (Key::KeyK, 0x4B),
    (Key::KeyL, 0x4C),
    (Key::KeyM, 0x4D),
    (Key::KeyN, 0x4E),
    (Key::KeyO, 0x4F),
    (Key::KeyP, 0x50),
    (Key::KeyQ, 0x51),
    (Key::KeyR, 0x52),
    (Key::KeyS, 0x53),
    (Key::KeyT, 0x54),
    (Key::KeyU, 0x55),
    (Key::KeyV, 0x56),
    (Key::KeyW, 0x57),
    (Key::KeyX, 0x58),
    (Key::KeyY, 0x59),
    (Key::KeyZ, 0x5A),
    (Key::MetaLeft, 0x5B),
    (Key::MetaRight, 0x5C),
    (Key::Kp0, 0x60),
    (Key::Kp1, 0x61),
    (Key::Kp2, 0x62),
    (Key::Kp3, 0x63),
    (Key::Kp4, 0x64),
    (Key::Kp5, 0x65),
    (Key::Kp6, 0x66),
    (Key::Kp7, 0x67),
    (Key::Kp8, 0x68),
    (Key::Kp9, 0x69),
    (Key::KpMultiply, 0x6A),
    (Key::KpPlus, 0x6B),
    (Key::KpMinus, 0x6D),
    (Key::KpDelete, 0x6E),
    (Key::KpDivide, 0x6F),
    (Key::F1, 0x70),
    (Key::F2, 0x71),
    (Key::F3, 0x72),
    (Key::F4, 0x73),
    (Key::F5, 0x74),
    (Key::F6, 0x75),
    (Key::F7, 0x76),
    (Key::F8, 0x77),
    (Key::F9, 0x78),
    (Key::F10, 0x79),
    (Key::F11, 0x7A),
    (Key::F12, 0x7B),
    (Key::NumLock, 0x90),
    (Key::ScrollLock, 0x91),
    (Key::ShiftLeft, 0xA0),
    (Key::ShiftRight, 0xA1),
    (Key::ControlLeft, 0xA2),
    (Key::ControlRight, 0xA3),
    (Key::Alt, 0xA4),
    (Key::AltGr, 0xA5),
    (Key::SemiColon, 0xBA),
    (Key::Equal, 0xBB),
    (Key::Comma, 0xBC),
    (Key::Minus, 0xBD),
    (Key::Dot, 0xBE),
    (Key::Slash, 0xBF),
    (Key::BackQuote, 0xC0),
    (Key::LeftBracket, 0xDB),
    (Key::BackSlash, 0xDC),
    (Key::RightBracket, 0xDD),
    (Key::Quote, 0xDE),
    (Key::IntlBackslash, 0xE2),
    // No virtual-key code exists for Fn; 0xFF is the reserved "no mapping" value
    (Key::Function, 0xFF),
];

/// Virtual-key code for an `rdev` key
pub fn key_to_code(key: Key) -> u32 {
    if let Key::Unknown(code) = key {
        return code;
    }

    KEYMAP
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, code)| *code)
        .unwrap_or(0xFF)
}

/// `rdev` key for a virtual-key code
pub fn code_to_key(code: u32) -> Key {
    KEYMAP
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(key, _)| *key)
        .unwrap_or(Key::Unknown(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_and_function_keys() {
        assert_eq!(key_to_code(Key::KeyA), 65);
        assert_eq!(key_to_code(Key::F9), 120);
        assert_eq!(code_to_key(122), Key::F11);
    }

    #[test]
    fn test_shared_code_maps_back_to_first_entry() {
        assert_eq!(key_to_code(Key::KpReturn), 0x0D);
        assert_eq!(code_to_key(0x0D), Key::Return);
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        assert_eq!(code_to_key(0x1234), Key::Unknown(0x1234));
        assert_eq!(key_to_code(Key::Unknown(0x1234)), 0x1234);
    }
}
