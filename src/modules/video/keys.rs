use super::geometry::AspectClass;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

/// Random bytes behind every object key (256 bits).
pub const KEY_ENTROPY_BYTES: usize = 32;

pub trait EntropySource: Send + Sync {
    fn fill(&self, buf: &mut [u8]);
}

/// Thread-local CSPRNG from `rand`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEntropy;

impl EntropySource for SystemEntropy {
    fn fill(&self, buf: &mut [u8]) {
        rand::rng().fill_bytes(buf);
    }
}

/// `<aspect>/<random-id>.<extension>`, the id being URL-safe base64 of
/// fresh entropy. Never derived from the video id, so re-uploads of the
/// same video never collide.
pub fn object_key(aspect: AspectClass, extension: &str, entropy: &dyn EntropySource) -> String {
    let mut raw = [0u8; KEY_ENTROPY_BYTES];
    entropy.fill(&mut raw);

    format!("{}/{}.{}", aspect.as_str(), URL_SAFE_NO_PAD.encode(raw), extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Fixed(u8);

    impl EntropySource for Fixed {
        fn fill(&self, buf: &mut [u8]) {
            buf.fill(self.0);
        }
    }

    #[test]
    fn key_shape_is_exact_under_fixed_entropy() {
        let key = object_key(AspectClass::Landscape, "mp4", &Fixed(0));
        assert_eq!(
            key,
            "landscape/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA.mp4"
        );

        let key = object_key(AspectClass::Portrait, "mp4", &Fixed(0xff));
        assert_eq!(
            key,
            "portrait/__________________________________________8.mp4"
        );
    }

    #[test]
    fn bucket_follows_aspect() {
        for (aspect, prefix) in [
            (AspectClass::Landscape, "landscape/"),
            (AspectClass::Portrait, "portrait/"),
            (AspectClass::Other, "other/"),
        ] {
            assert!(object_key(aspect, "mp4", &SystemEntropy).starts_with(prefix));
        }
    }

    #[test]
    fn system_keys_are_url_safe_and_distinct() {
        let keys: HashSet<String> = (0..256)
            .map(|_| object_key(AspectClass::Other, "mp4", &SystemEntropy))
            .collect();
        assert_eq!(keys.len(), 256);

        for key in &keys {
            let id = key
                .strip_prefix("other/")
                .and_then(|k| k.strip_suffix(".mp4"))
                .unwrap();
            assert_eq!(id.len(), 43);
            assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }
}
