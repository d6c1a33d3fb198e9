//! Protocol lookup tables
//!
//! Display positions, mode codes, special identifiers, modifier escapes and
//! special-function labels are kept in immutable static tables. [`Tables`]
//! indexes them by code and can be extended with further entries without
//! touching the frame or packet layers.

use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Label reserved for the priority text file
pub const PRIORITY_FILE_LABEL: u8 = 0x30;
/// Label reserved as the wildcard/broadcast label
pub const WILDCARD_FILE_LABEL: u8 = 0x3F;

/// Whether `label` may address a text file
///
/// Any printable byte except the priority and wildcard labels.
pub fn is_valid_file_label(label: u8) -> bool {
    (0x20..=0x7E).contains(&label) && label != PRIORITY_FILE_LABEL && label != WILDCARD_FILE_LABEL
}

/// Where on the sign a message is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DisplayPosition {
    pub code: u8,
    pub name: &'static str,
    pub description: &'static str,
}

/// Transition effect used to bring a message onto the sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ModeCode {
    pub code: u8,
    pub name: &'static str,
    pub description: &'static str,
    /// A special identifier byte must follow this mode
    pub takes_identifier: bool,
}

/// Animation graphic selected by the SPECIAL mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpecialIdentifier {
    pub code: u8,
    pub name: &'static str,
    pub description: &'static str,
}

/// Two-byte in-message toggle for a rendering attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ModifierEscape {
    pub bytes: [u8; 2],
    pub name: &'static str,
}

/// Function selected by a Write Special Function packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpecialFunction {
    pub label: u8,
    pub name: &'static str,
    /// Sign families or protocol levels the function is limited to
    pub availability: Option<&'static str>,
}

/// Mode code of the SPECIAL transition
pub const MODE_SPECIAL: u8 = 0x6E;

pub static DISPLAY_POSITIONS: &[DisplayPosition] = &[
    DisplayPosition {
        code: 0x20,
        name: "Middle Line",
        description: "Text centered vertically.",
    },
    DisplayPosition {
        code: 0x22,
        name: "Top Line",
        description: "Text begins on the top line and uses all lines minus one.",
    },
    DisplayPosition {
        code: 0x26,
        name: "Bottom Line",
        description: "Text starts on the line after the last Top Line line.",
    },
    DisplayPosition {
        code: 0x30,
        name: "Fill",
        description: "Fills all available lines, centered vertically.",
    },
    DisplayPosition {
        code: 0x31,
        name: "Left",
        description: "Text begins on the left side of the sign (Alpha 3.0).",
    },
    DisplayPosition {
        code: 0x32,
        name: "Right",
        description: "Text begins on the right side of the sign (Alpha 3.0).",
    },
];

const fn mode(code: u8, name: &'static str, description: &'static str) -> ModeCode {
    ModeCode {
        code,
        name,
        description,
        takes_identifier: false,
    }
}

pub static MODE_CODES: &[ModeCode] = &[
    mode(0x61, "ROTATE", "Message travels right to left."),
    mode(0x62, "HOLD", "Message remains stationary."),
    mode(0x63, "FLASH", "Message remains stationary and flashes."),
    mode(0x65, "ROLL UP", "Previous message is pushed up by a new message."),
    mode(0x66, "ROLL DOWN", "Previous message is pushed down by a new message."),
    mode(0x67, "ROLL LEFT", "Previous message is pushed left by a new message."),
    mode(0x68, "ROLL RIGHT", "Previous message is pushed right by a new message."),
    mode(0x69, "WIPE UP", "New message is wiped over the previous one from bottom to top."),
    mode(0x6A, "WIPE DOWN", "New message is wiped over the previous one from top to bottom."),
    mode(0x6B, "WIPE LEFT", "New message is wiped over the previous one from right to left."),
    mode(0x6C, "WIPE RIGHT", "New message is wiped over the previous one from left to right."),
    mode(0x6D, "SCROLL", "New line pushes the bottom line to the top line on 2-line signs."),
    ModeCode {
        code: MODE_SPECIAL,
        name: "SPECIAL",
        description: "Followed by a special identifier selecting an animation.",
        takes_identifier: true,
    },
    mode(0x6F, "AUTOMODE", "Modes are chosen automatically."),
    mode(0x70, "ROLL IN", "Previous message is pushed toward the center."),
    mode(0x71, "ROLL OUT", "Previous message is pushed outward from the center."),
    mode(0x72, "WIPE IN", "New message is wiped over the previous one inward."),
    mode(0x73, "WIPE OUT", "New message is wiped over the previous one outward."),
    mode(0x74, "COMPRESSED ROTATE", "Rotate with half-width characters (select models)."),
    mode(0x75, "EXPLODE", "Message flies apart from the center (Alpha 3.0)."),
    mode(0x76, "CLOCK", "Wipe in a clockwise direction (Alpha 3.0)."),
    mode(0x30, "TWINKLE", "Message twinkles on the sign."),
    mode(0x31, "SPARKLE", "New message sparkles over the current message."),
    mode(0x32, "SNOW", "Message snows onto the display."),
    mode(0x33, "INTERLOCK", "New message interlocks over the current one in alternating rows."),
    mode(0x34, "SWITCH", "Alternating characters switch off and the new message switches on."),
    mode(0x35, "SLIDE", "New message slides on one character at a time from right to left."),
    mode(0x36, "SPRAY", "New message sprays across the sign from right to left."),
    mode(0x37, "STARBURST", "Starbursts explode the new message onto the sign."),
    mode(0x38, "WELCOME", "The word Welcome is written in script across the sign."),
    mode(0x39, "SLOT MACHINE", "Slot machine symbols appear randomly across the sign."),
    mode(0x3A, "NEWS FLASH", "News flash animation."),
    mode(0x3B, "TRUMPET", "Trumpet animation."),
    mode(0x43, "CYCLE COLORS", "Color changes from one color to another."),
];

pub static SPECIAL_IDENTIFIERS: &[SpecialIdentifier] = &[
    SpecialIdentifier {
        code: 0x53,
        name: "THANK YOU",
        description: "Thank You is written in script across the sign.",
    },
    SpecialIdentifier {
        code: 0x55,
        name: "NO SMOKING",
        description: "A cigarette is extinguished and replaced with a no smoking symbol.",
    },
    SpecialIdentifier {
        code: 0x56,
        name: "DON'T DRINK & DRIVE",
        description: "A car runs into a cocktail glass.",
    },
    SpecialIdentifier {
        code: 0x57,
        name: "RUNNING ANIMAL",
        description: "An animal (or fish) runs across the sign.",
    },
    SpecialIdentifier {
        code: 0x58,
        name: "FIREWORKS",
        description: "Fireworks explode randomly across the sign.",
    },
    SpecialIdentifier {
        code: 0x59,
        name: "TURBO CAR",
        description: "A car (or balloon) drives across the sign.",
    },
    SpecialIdentifier {
        code: 0x5A,
        name: "CHERRY BOMB",
        description: "A fuse burns down followed by an explosion.",
    },
];

pub static MODIFIER_ESCAPES: &[ModifierEscape] = &[
    ModifierEscape {
        bytes: [0x05, b'0'],
        name: "Double Height Off",
    },
    ModifierEscape {
        bytes: [0x05, b'1'],
        name: "Double Height On",
    },
    ModifierEscape {
        bytes: [0x06, b'0'],
        name: "True Descenders Off",
    },
    ModifierEscape {
        bytes: [0x06, b'1'],
        name: "True Descenders On",
    },
];

const fn function(label: u8, name: &'static str, availability: Option<&'static str>) -> SpecialFunction {
    SpecialFunction {
        label,
        name,
        availability,
    }
}

pub static SPECIAL_FUNCTIONS: &[SpecialFunction] = &[
    function(0x20, "Set Time of Day", None),
    function(0x21, "Set Speaker", None),
    function(0x24, "Configure Memory", None),
    function(0x26, "Set Day of Week", None),
    function(0x27, "Set Time Format", None),
    function(0x28, "Generate Speaker Tone", Some("Alpha 2.0 and 3.0")),
    function(0x29, "Set Run Time Table", None),
    function(0x2B, "Display Text at XY Position", None),
    function(0x2C, "Soft Reset", None),
    function(0x2E, "Set Run Sequence", None),
    function(0x2F, "Set Dimming Register", Some("solar signs")),
    function(0x32, "Set Run Day Table", None),
    function(0x34, "Clear Serial Error Status Register", Some("first packet of nested frames")),
    function(0x35, "Set Counter", None),
    function(0x37, "Set Serial Address", Some("reverts to switch setting at power cycle")),
    function(0x38, "Set Large Dots Picture Memory Configuration", None),
    function(0x39, "Append to Large Dots Picture Memory Configuration", None),
    function(0x3A, "Set Run File Times", Some("Alpha 2.0 and 3.0")),
    function(0x3B, "Set Date", None),
    function(0x3C, "Program Custom Character Set", Some("Alpha 2.0 and 3.0")),
    function(0x3D, "Set Automode Table", Some("Alpha 2.0 and 3.0")),
    function(0x40, "Set Dimming Times", Some("AlphaEclipse")),
    function(0x54, "Set Temperature Offset", Some("790i, 460i, 440i and 430i")),
];

/// Indexed lookup tables
///
/// [`Tables::default`] indexes the static tables above; further entries can
/// be registered, replacing any existing entry with the same code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    display_positions: BTreeMap<u8, DisplayPosition>,
    modes: BTreeMap<u8, ModeCode>,
    special_identifiers: BTreeMap<u8, SpecialIdentifier>,
    modifiers: BTreeMap<[u8; 2], ModifierEscape>,
    special_functions: BTreeMap<u8, SpecialFunction>,
}

impl Tables {
    /// Tables with no entries
    pub fn empty() -> Self {
        Self {
            display_positions: BTreeMap::new(),
            modes: BTreeMap::new(),
            special_identifiers: BTreeMap::new(),
            modifiers: BTreeMap::new(),
            special_functions: BTreeMap::new(),
        }
    }

    /// Shared instance holding the built-in tables
    pub fn builtin() -> &'static Tables {
        static BUILTIN: OnceLock<Tables> = OnceLock::new();
        BUILTIN.get_or_init(Tables::default)
    }

    pub fn display_position(&self, code: u8) -> Option<&DisplayPosition> {
        self.display_positions.get(&code)
    }

    pub fn mode(&self, code: u8) -> Option<&ModeCode> {
        self.modes.get(&code)
    }

    pub fn special_identifier(&self, code: u8) -> Option<&SpecialIdentifier> {
        self.special_identifiers.get(&code)
    }

    /// Modifier escape starting at the beginning of `bytes`, if any
    pub fn modifier(&self, bytes: &[u8]) -> Option<&ModifierEscape> {
        let key: [u8; 2] = bytes.get(..2)?.try_into().ok()?;
        self.modifiers.get(&key)
    }

    pub fn special_function(&self, label: u8) -> Option<&SpecialFunction> {
        self.special_functions.get(&label)
    }

    /// Look up a display position by name, ignoring case
    pub fn display_position_by_name(&self, name: &str) -> Option<&DisplayPosition> {
        self.display_positions
            .values()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Look up a mode by name, ignoring case
    pub fn mode_by_name(&self, name: &str) -> Option<&ModeCode> {
        self.modes.values().find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Look up a special identifier by name, ignoring case
    pub fn special_identifier_by_name(&self, name: &str) -> Option<&SpecialIdentifier> {
        self.special_identifiers
            .values()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn register_display_position(&mut self, entry: DisplayPosition) -> Option<DisplayPosition> {
        self.display_positions.insert(entry.code, entry)
    }

    pub fn register_mode(&mut self, entry: ModeCode) -> Option<ModeCode> {
        self.modes.insert(entry.code, entry)
    }

    pub fn register_special_identifier(
        &mut self,
        entry: SpecialIdentifier,
    ) -> Option<SpecialIdentifier> {
        self.special_identifiers.insert(entry.code, entry)
    }

    pub fn register_modifier(&mut self, entry: ModifierEscape) -> Option<ModifierEscape> {
        self.modifiers.insert(entry.bytes, entry)
    }

    pub fn register_special_function(&mut self, entry: SpecialFunction) -> Option<SpecialFunction> {
        self.special_functions.insert(entry.label, entry)
    }
}

impl Default for Tables {
    fn default() -> Self {
        let mut tables = Self::empty();
        for &entry in DISPLAY_POSITIONS {
            tables.register_display_position(entry);
        }
        for &entry in MODE_CODES {
            tables.register_mode(entry);
        }
        for &entry in SPECIAL_IDENTIFIERS {
            tables.register_special_identifier(entry);
        }
        for &entry in MODIFIER_ESCAPES {
            tables.register_modifier(entry);
        }
        for &entry in SPECIAL_FUNCTIONS {
            tables.register_special_function(entry);
        }
        tables
    }
}
