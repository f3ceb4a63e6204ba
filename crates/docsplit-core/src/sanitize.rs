/// Longest file stem produced by [`sanitize_file_stem`], in characters.
pub const MAX_FILE_STEM_CHARS: usize = 100;

const ILLEGAL: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Make a header label usable as a file name stem.
///
/// Each of `\ / * ? : " < > |` becomes `_` and the result is capped at
/// [`MAX_FILE_STEM_CHARS`] characters. Applying it twice gives the same
/// result as applying it once.
pub fn sanitize_file_stem(label: &str) -> String {
    label
        .chars()
        .map(|c| if ILLEGAL.contains(&c) { '_' } else { c })
        .take(MAX_FILE_STEM_CHARS)
        .collect()
}

/// True if `c` cannot appear in an archive entry name on common filesystems.
pub fn is_illegal_path_char(c: char) -> bool {
    ILLEGAL.contains(&c)
}
