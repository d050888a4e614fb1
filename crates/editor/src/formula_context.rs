//! Formula Context Analyzer
//!
//! Answers "what is under the caret?" for a formula buffer. Autocomplete and
//! reference pointing both route through [`analyze`].
//!
//! All positions are char indices from the start of the buffer, including the
//! leading '='.

use std::ops::Range;

use crate::session::is_formula_text;

// ============================================================================
// Core Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct FormulaContext {
    pub mode: FormulaEditMode,

    /// Caret position, clamped to the buffer
    pub cursor: usize,

    /// Innermost known function whose argument list contains the caret
    pub current_function: Option<&'static FunctionInfo>,

    /// 0-indexed argument of `current_function`
    pub current_arg_index: Option<usize>,

    /// What an accepted suggestion replaces
    pub replace_range: Range<usize>,

    /// Identifier under the caret, for prefix filtering
    pub identifier_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaEditMode {
    /// Right after '=' with nothing typed
    Start,
    /// Typing a name (function or not yet known)
    Identifier,
    /// After '(' or ','
    ArgList,
    String,
    /// On a cell reference or range
    Reference,
    /// After an operator or comparison
    Operator,
    Number,
    /// After a complete operand or ')'
    Complete,
}

impl FormulaEditMode {
    /// Positions where a new operand may start.
    pub fn accepts_operand(self) -> bool {
        matches!(self, Self::Start | Self::ArgList | Self::Operator)
    }
}

// ============================================================================
// Function Metadata
// ============================================================================

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub name: &'static str,
    pub signature: &'static str,
    pub description: &'static str,
}

macro_rules! functions {
    ($($name:literal, $sig:literal, $desc:literal;)*) => {
        &[$(FunctionInfo { name: $name, signature: $sig, description: $desc }),*]
    };
}

/// Known functions, sorted by name.
pub static FUNCTIONS: &[FunctionInfo] = functions! {
    "ABS", "ABS(number)", "Returns the absolute value of a number.";
    "AND", "AND(logical1, [logical2], ...)", "Returns TRUE if all arguments are TRUE.";
    "AVERAGE", "AVERAGE(number1, [number2], ...)", "Returns the average of the arguments.";
    "AVERAGEIF", "AVERAGEIF(range, criteria, [average_range])", "Averages cells that meet a condition.";
    "CONCAT", "CONCAT(text1, [text2], ...)", "Joins several text items into one.";
    "CONCATENATE", "CONCATENATE(text1, [text2], ...)", "Joins several text items into one.";
    "COUNT", "COUNT(value1, [value2], ...)", "Counts the number of cells that contain numbers.";
    "COUNTA", "COUNTA(value1, [value2], ...)", "Counts the number of non-empty cells.";
    "COUNTBLANK", "COUNTBLANK(range)", "Counts empty cells in a range.";
    "COUNTIF", "COUNTIF(range, criteria)", "Counts cells that meet a condition.";
    "DATE", "DATE(year, month, day)", "Returns the serial number of a date.";
    "DAY", "DAY(date)", "Returns the day of the month.";
    "IF", "IF(condition, value_if_true, [value_if_false])", "Returns one value if TRUE, another if FALSE.";
    "IFERROR", "IFERROR(value, value_if_error)", "Returns a fallback if the value is an error.";
    "INDEX", "INDEX(array, row_num, [col_num])", "Returns a value at a position in a range.";
    "INT", "INT(number)", "Rounds a number down to the nearest integer.";
    "LEFT", "LEFT(text, [num_chars])", "Returns leftmost characters of a text value.";
    "LEN", "LEN(text)", "Returns the number of characters in text.";
    "LOWER", "LOWER(text)", "Converts text to lowercase.";
    "MATCH", "MATCH(lookup_value, lookup_array, [match_type])", "Returns the position of a value in a range.";
    "MAX", "MAX(number1, [number2], ...)", "Returns the largest value in a set of values.";
    "MEDIAN", "MEDIAN(number1, [number2], ...)", "Returns the median of the given numbers.";
    "MID", "MID(text, start_num, num_chars)", "Returns characters from the middle of text.";
    "MIN", "MIN(number1, [number2], ...)", "Returns the smallest value in a set of values.";
    "MOD", "MOD(number, divisor)", "Returns the remainder after division.";
    "MONTH", "MONTH(date)", "Returns the month of a date.";
    "NOT", "NOT(logical)", "Reverses a logical value.";
    "NOW", "NOW()", "Returns the current date and time.";
    "OR", "OR(logical1, [logical2], ...)", "Returns TRUE if any argument is TRUE.";
    "POWER", "POWER(number, power)", "Returns a number raised to a power.";
    "PRODUCT", "PRODUCT(number1, [number2], ...)", "Multiplies all the numbers given.";
    "RIGHT", "RIGHT(text, [num_chars])", "Returns rightmost characters of a text value.";
    "ROUND", "ROUND(number, num_digits)", "Rounds a number to a specified number of digits.";
    "ROUNDDOWN", "ROUNDDOWN(number, num_digits)", "Rounds a number toward zero.";
    "ROUNDUP", "ROUNDUP(number, num_digits)", "Rounds a number away from zero.";
    "SQRT", "SQRT(number)", "Returns the square root of a number.";
    "SUBSTITUTE", "SUBSTITUTE(text, old_text, new_text, [instance_num])", "Replaces text in a string.";
    "SUM", "SUM(number1, [number2], ...)", "Adds all the numbers in a range of cells.";
    "SUMIF", "SUMIF(range, criteria, [sum_range])", "Adds cells that meet a condition.";
    "SUMPRODUCT", "SUMPRODUCT(array1, [array2], ...)", "Returns the sum of products of ranges.";
    "TEXT", "TEXT(value, format_text)", "Formats a number as text.";
    "TODAY", "TODAY()", "Returns the current date.";
    "TRIM", "TRIM(text)", "Removes extra spaces from text.";
    "UPPER", "UPPER(text)", "Converts text to uppercase.";
    "VALUE", "VALUE(text)", "Converts text to a number.";
    "VLOOKUP", "VLOOKUP(lookup_value, table_array, col_index, [range_lookup])", "Looks up a value in the first column of a table.";
    "YEAR", "YEAR(date)", "Returns the year of a date.";
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Look up a function by name (case-insensitive)
pub fn get_function(name: &str) -> Option<&'static FunctionInfo> {
    let upper = name.to_ascii_uppercase();
    FUNCTIONS.iter().find(|f| f.name == upper)
}

/// All functions whose name starts with `prefix` (case-insensitive)
pub fn get_functions_by_prefix(prefix: &str) -> Vec<&'static FunctionInfo> {
    let upper = prefix.to_ascii_uppercase();
    FUNCTIONS.iter().filter(|f| f.name.starts_with(&upper)).collect()
}

/// Convert char index to byte offset
pub fn char_to_byte(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map(|(i, _)| i).unwrap_or(s.len())
}

// ============================================================================
// Tokenizer
// ============================================================================

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    start: usize,
    end: usize,
    text: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TokenKind {
    Equals,
    Identifier,
    Number,
    String,
    CellRef,
    Operator,
    Comparison,
    LParen,
    RParen,
    Comma,
    Colon,
    Whitespace,
    Unknown,
}

fn tokenize(formula: &str) -> Vec<Token> {
    let chars: Vec<char> = formula.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let span = |start: usize, end: usize| chars[start..end].iter().collect::<String>();

    while i < chars.len() {
        let start = i;
        let c = chars[i];
        let kind = match c {
            '=' if tokens.iter().all(|t: &Token| t.kind == TokenKind::Whitespace) => {
                i += 1;
                TokenKind::Equals
            }
            ' ' | '\t' => {
                while i < chars.len() && matches!(chars[i], ' ' | '\t') {
                    i += 1;
                }
                TokenKind::Whitespace
            }
            '+' | '-' | '*' | '/' | '&' | '^' => {
                i += 1;
                TokenKind::Operator
            }
            '<' => {
                i += 1;
                if i < chars.len() && matches!(chars[i], '=' | '>') {
                    i += 1;
                }
                TokenKind::Comparison
            }
            '>' => {
                i += 1;
                if i < chars.len() && chars[i] == '=' {
                    i += 1;
                }
                TokenKind::Comparison
            }
            '=' => {
                i += 1;
                TokenKind::Comparison
            }
            '(' => {
                i += 1;
                TokenKind::LParen
            }
            ')' => {
                i += 1;
                TokenKind::RParen
            }
            ',' => {
                i += 1;
                TokenKind::Comma
            }
            ':' => {
                i += 1;
                TokenKind::Colon
            }
            '"' => {
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    i += 1;
                }
                if i < chars.len() {
                    i += 1; // closing quote
                }
                TokenKind::String
            }
            '0'..='9' | '.' => {
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                TokenKind::Number
            }
            'A'..='Z' | 'a'..='z' | '_' | '$' => {
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || matches!(chars[i], '_' | '$')) {
                    i += 1;
                }
                if is_cell_ref(&span(start, i)) {
                    TokenKind::CellRef
                } else {
                    TokenKind::Identifier
                }
            }
            _ => {
                i += 1;
                TokenKind::Unknown
            }
        };
        tokens.push(Token { kind, start, end: i, text: span(start, i) });
    }

    tokens
}

/// Check if a string is an A1-style cell reference (A1, $B$2, AA10)
fn is_cell_ref(s: &str) -> bool {
    let s = s.strip_prefix('$').unwrap_or(s);
    let letters = s.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    if letters == 0 || letters > 3 {
        return false;
    }
    let rest = &s[letters..];
    let digits = rest.strip_prefix('$').unwrap_or(rest);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

// ============================================================================
// Context Analyzer
// ============================================================================

/// Analyze a formula buffer at a caret position.
pub fn analyze(formula: &str, cursor: usize) -> FormulaContext {
    let cursor = cursor.min(formula.chars().count());
    let tokens = tokenize(formula);

    // Token ending at or spanning the caret. Prefer the one to the left so
    // "=SU|" reports the identifier rather than nothing.
    let token_at_cursor = tokens
        .iter()
        .filter(|t| t.start < cursor && cursor <= t.end)
        .last()
        .cloned();

    let mode = determine_mode(&tokens, cursor, token_at_cursor.as_ref());
    let (current_function, current_arg_index) = find_function_context(&tokens, cursor);

    let replace_range = match (&mode, &token_at_cursor) {
        (FormulaEditMode::Identifier, Some(t)) => t.start..t.end,
        _ => cursor..cursor,
    };

    let identifier_text = token_at_cursor
        .filter(|t| t.kind == TokenKind::Identifier)
        .map(|t| t.text);

    FormulaContext {
        mode,
        cursor,
        current_function,
        current_arg_index,
        replace_range,
        identifier_text,
    }
}

/// True if a cell reference may be inserted at `cursor`: the buffer is a
/// formula and the caret follows '=', '(', ',' or an operator.
pub fn is_reference_insertion_point(formula: &str, cursor: usize) -> bool {
    is_formula_text(formula) && analyze(formula, cursor).mode.accepts_operand()
}

fn determine_mode(tokens: &[Token], cursor: usize, token_at_cursor: Option<&Token>) -> FormulaEditMode {
    if let Some(token) = token_at_cursor {
        match token.kind {
            TokenKind::String if cursor < token.end || !token.text.ends_with('"') || token.text.len() == 1 => {
                return FormulaEditMode::String
            }
            TokenKind::Number => return FormulaEditMode::Number,
            TokenKind::CellRef => return FormulaEditMode::Reference,
            TokenKind::Identifier => return FormulaEditMode::Identifier,
            _ => {}
        }
    }

    let prev = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Whitespace && t.end <= cursor)
        .last();

    match prev.map(|t| t.kind) {
        None | Some(TokenKind::Equals) => FormulaEditMode::Start,
        Some(TokenKind::LParen) | Some(TokenKind::Comma) => FormulaEditMode::ArgList,
        Some(TokenKind::Operator) | Some(TokenKind::Comparison) | Some(TokenKind::Colon) => {
            FormulaEditMode::Operator
        }
        _ => FormulaEditMode::Complete,
    }
}

fn find_function_context(tokens: &[Token], cursor: usize) -> (Option<&'static FunctionInfo>, Option<usize>) {
    // (function or None for a bare group, arg index)
    let mut stack: Vec<(Option<&'static FunctionInfo>, usize)> = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        if token.end > cursor {
            break;
        }
        match token.kind {
            TokenKind::LParen => {
                let func = tokens[..idx]
                    .iter()
                    .rev()
                    .find(|t| t.kind != TokenKind::Whitespace)
                    .filter(|t| t.kind == TokenKind::Identifier)
                    .and_then(|t| get_function(&t.text));
                stack.push((func, 0));
            }
            TokenKind::RParen => {
                stack.pop();
            }
            TokenKind::Comma => {
                if let Some((_, arg)) = stack.last_mut() {
                    *arg += 1;
                }
            }
            _ => {}
        }
    }

    match stack.last() {
        Some((Some(func), arg)) => (Some(*func), Some(*arg)),
        _ => (None, None),
    }
}
