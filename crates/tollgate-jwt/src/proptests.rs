//! Property-based tests for the JWT codec.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::{JwtCodec, JwtSettings};
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;
    use tollgate_core::{Authenticator, LoginInfo};

    fn timestamp() -> impl Strategy<Value = Option<DateTime<Utc>>> {
        proptest::option::of(
            (0i64..4_000_000_000, 0u32..1_000_000_000)
                .prop_map(|(secs, nanos)| DateTime::from_timestamp(secs, nanos).unwrap()),
        )
    }

    proptest! {
        #[test]
        fn test_round_trip(
            id in "[A-Za-z0-9-]{1,36}",
            provider in "\\PC{1,16}",
            key in "\\PC{1,32}",
            touched in timestamp(),
            expires in timestamp(),
            tags in proptest::collection::vec("[a-z]{1,8}", 0..4),
            fingerprint in proptest::option::of("[0-9a-f]{64}"),
        ) {
            let codec = JwtCodec::new(JwtSettings::new("s3cr3t")).unwrap();
            let mut a = Authenticator::new(id, LoginInfo::new(provider, key))
                .with_touched(touched)
                .with_expires(expires)
                .with_tags(tags);
            if let Some(fingerprint) = fingerprint {
                a = a.with_fingerprint(fingerprint);
            }

            let token = codec.encode(&a).unwrap();
            prop_assert_eq!(codec.decode(&token).unwrap(), a);
        }
    }
}
