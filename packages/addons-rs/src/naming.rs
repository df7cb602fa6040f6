//! Name cleaning and type identifier derivation.
//!
//! A type identifier is `CLEAN(library)_CLEAN(application)_CLEAN(action)`.
//! Cleaning uppercases the name and collapses the first whitespace run, along
//! with any hyphens directly in front of it, into a single underscore. Bare
//! hyphens survive:
//!
//! ```
//! use addons::naming::{action_type, clean};
//!
//! assert_eq!(clean("app one"), "APP_ONE");
//! assert_eq!(clean("idle- monitor"), "IDLE_MONITOR");
//! assert_eq!(action_type("My-Lib", "app one", "do-thing"), "MY-LIB_APP_ONE_DO-THING");
//! ```

/// Separator between the three cleaned segments of a type identifier.
pub const SEGMENT_SEPARATOR: char = '_';

/// Cleans a raw name into an uppercase token.
///
/// Only the first `-*\s+` run is replaced; later runs are left as they are.
pub fn clean(name: &str) -> String {
    let upper = name.to_uppercase();

    match first_hyphen_space_run(&upper) {
        Some((start, end)) => {
            let mut cleaned = String::with_capacity(upper.len());
            cleaned.push_str(&upper[..start]);
            cleaned.push(SEGMENT_SEPARATOR);
            cleaned.push_str(&upper[end..]);
            cleaned
        }
        None => upper,
    }
}

/// Derives the globally unique type identifier for an action.
pub fn action_type(library_name: &str, application_name: &str, action_name: &str) -> String {
    let mut out = clean(library_name);
    out.push(SEGMENT_SEPARATOR);
    out.push_str(&clean(application_name));
    out.push(SEGMENT_SEPARATOR);
    out.push_str(&clean(action_name));
    out
}

/// Byte range of the leftmost run of zero or more hyphens followed by one or
/// more whitespace characters.
fn first_hyphen_space_run(s: &str) -> Option<(usize, usize)> {
    let mut chars = s.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let mut end = None;
        if c.is_whitespace() {
            end = Some(start + c.len_utf8());
        } else if c == '-' {
            while chars.next_if(|&(_, c)| c == '-').is_some() {}
        } else {
            continue;
        }

        while let Some((i, c)) = chars.next_if(|&(_, c)| c.is_whitespace()) {
            end = Some(i + c.len_utf8());
        }

        if let Some(end) = end {
            return Some((start, end));
        }
    }

    None
}
