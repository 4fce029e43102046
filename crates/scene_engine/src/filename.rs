/// Portable local filename for a downloaded file; server-supplied names may
/// carry path separators or characters Windows rejects.
pub fn download_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    if compacted.is_empty() {
        return "download".to_string();
    }
    if compacted.len() > MAX_LEN {
        compacted = truncate_keeping_extension(&compacted);
    }
    if is_reserved_windows_name(stem(&compacted)) {
        compacted.insert(stem(&compacted).len(), '_');
    }
    compacted
}

const MAX_LEN: usize = 120;

fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}')
}

fn stem(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

fn truncate_keeping_extension(name: &str) -> String {
    let ext_start = name.find('.').filter(|&i| name.len() - i <= 16).unwrap_or(name.len());
    let (head, ext) = name.split_at(ext_start);
    let mut keep = MAX_LEN.saturating_sub(ext.len());
    while !head.is_char_boundary(keep) {
        keep -= 1;
    }
    format!("{}{}", &head[..keep], ext)
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_and_reserved_names_are_neutralized() {
        assert_eq!(download_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(download_filename("a:b*?c.nii.gz"), "a_b_c.nii.gz");
        assert_eq!(download_filename("con.nii"), "con_.nii");
        assert_eq!(download_filename("..."), "download");
    }

    #[test]
    fn long_names_keep_their_extension() {
        let long = format!("{}.nii.gz", "x".repeat(300));
        let cleaned = download_filename(&long);
        assert_eq!(cleaned.len(), MAX_LEN);
        assert!(cleaned.ends_with(".nii.gz"));
    }
}
