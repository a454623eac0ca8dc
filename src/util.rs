use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic pair in `[-1, 1]` derived from a string key.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Element key safe for renderers that address nodes by selector: `"id"`
/// followed by the id with everything outside `[A-Za-z0-9_-]` removed.
pub fn sanitize_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len() + 2);
    out.push_str("id");
    out.extend(
        id.chars()
            .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-'),
    );
    out
}

pub fn format_commits(count: u64) -> String {
    if count == 1 {
        "1 commit".to_owned()
    } else {
        format!("{count} commits")
    }
}
