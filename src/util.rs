use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const LABEL_LIMIT: usize = 15;

fn stable_hash(id: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    hasher.finish()
}

/// Label shown on the canvas: long ids are cut to fifteen characters.
pub fn short_label(id: &str) -> String {
    if id.chars().count() > LABEL_LIMIT {
        let cut = id.chars().take(LABEL_LIMIT).collect::<String>();
        format!("{cut}...")
    } else {
        id.to_owned()
    }
}

/// Deterministic pair in `[-1, 1]` derived from an id.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let hash = stable_hash(id);

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Deterministic value in `[0, 1]` derived from an id.
pub fn stable_unit(id: &str) -> f32 {
    let hash = stable_hash(id);
    ((hash >> 11) as f64 / (u64::MAX >> 11) as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_label_cuts_long_ids() {
        assert_eq!(short_label("GAS-X-GRID"), "GAS-X-GRID");
        assert_eq!(short_label("Marktpartner-Portal-Gateway"), "Marktpartner-Po...");
    }

    #[test]
    fn stable_values_are_repeatable_and_bounded() {
        assert_eq!(stable_pair("VHP"), stable_pair("VHP"));
        let unit = stable_unit("flow-17");
        assert!((0.0..=1.0).contains(&unit));
        assert_eq!(unit, stable_unit("flow-17"));
    }
}
