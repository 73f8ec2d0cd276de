//! Fixed vocabularies consulted by the line rules. Extend these tables rather
//! than the rule engine when the wiki grows new noise.

/// Literal that opens the script-engine body on a story page.
pub const SCRIPT_MARKER: &str = "[HEADER";

/// Lines longer than this (in chars) are minified code or markup.
pub const MAX_LINE_CHARS: usize = 300;

/// Prefixes left over from HTML that never start a story line.
pub const MARKUP_PREFIXES: &[char] = &['<', '&'];

/// Substrings that only show up in inline CSS/JS.
pub const CODE_SIGNATURES: &[&str] = &[
    "{", "}", "function(", "var ", "const ", "let ", "return ", "console.", "document.",
    "window.", "ele.", "Math.", "if(", "else", "switch", "case ", "default:", "break;",
    "system.",
];

/// Statement terminator checked as a suffix.
pub const STATEMENT_TERMINATOR: &str = ";";

/// Assignment operator with surrounding spaces.
pub const ASSIGNMENT: &str = " = ";

pub const URL_SCHEMES: &[&str] = &["http:", "https:"];

/// AVG script commands (stage directions), matched as `keyword:` prefixes.
pub const SCRIPT_COMMANDS: &[&str] = &[
    "char", "tween", "image", "override", "background", "blocker", "cameraeffect",
    "grayscale", "camerashake", "character", "characteraction", "move", "jump", "shake",
    "zoom", "exit", "charactercutin", "charslot", "curtain", "delay", "decision", "dialog",
    "header", "hideitem", "imagerotate", "imagetween", "gridbg", "verticalbg", "largebg",
    "largeimg", "multiline", "musicvolume", "soundvolume", "playmusic", "playsound",
    "predicate", "showitem", "skipnode", "stopmusic", "stopsound", "sticker", "theater",
    "timerclear", "timersticker", "video",
];

/// Keys of the edit-API payloads embedded in page scripts.
pub const METADATA_KEYS: &[&str] = &["bot:", "text:", "token:", "flag:", "mode:"];

pub const COMMENT_PREFIXES: &[&str] = &["*", "/*", "//"];

/// Navigation separators; any line containing one is a breadcrumb or stage list.
pub const BOILERPLATE_SUBSTRINGS: &[&str] = &["·"];

/// Category and stage-list headers that appear as whole lines.
pub const BOILERPLATE_LINES: &[&str] = &[
    "特殊", "剧情", "主线", "支线", "活动剧情一览", "危机合约", "集成战略", "生息演算",
];

/// Unlock conditions, hints, stage info and disclaimers.
pub const NOISE_PHRASES: &[&str] = &[
    "解锁条件", "点此查看", "主线剧情一览", "关卡一览", "温馨提示", "注意事项", "推荐等级",
    "首次掉落", "三星获得", "注释与链接", "本页可能包含", "剧情可能无法",
];

/// Template parameter names that leak into rendered text.
pub const EXCLUDED_TOKENS: &[&str] = &["axia_name", "nbs", "title"];

/// Separators that make a CJK line read as `speaker : text`.
pub const DIALOGUE_SEPARATORS: &[&str] = &[" : ", "："];

/// A CJK line ending in one of these is a finished sentence.
pub const TERMINAL_PUNCTUATION: &[char] = &['。', '？', '！', '…', '—', '♪', '.', '~', '”', '"'];

/// A CJK line opening with one of these is quoted speech or an aside.
pub const OPENING_MARKS: &[char] = &['“', '‘', '（', '【'];

/// Characters a line may consist of and still count as punctuation-only.
pub const PUNCTUATION_ONLY: &[char] = &[
    '.', ',', '?', '!', ':', ';', '\'', '"', '(', ')', '-', '—', '…',
];

/// Symbols that mark a non-CJK line as code residue.
pub const CODE_SYMBOLS: &[char] = &['(', ')', '_', '/', '{', '}', '['];
