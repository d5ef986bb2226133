//! Property-based tests for authenticators and validators.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::authenticator::{Authenticator, LoginInfo};
    use crate::validator::{ExpirationValidator, Status, Validator, Validators};
    use crate::{FixedClock, Result};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use proptest::prelude::*;

    struct Fixed(Status);

    #[async_trait]
    impl Validator for Fixed {
        async fn is_valid(&self, _: &Authenticator) -> Result<Status> {
            Ok(self.0.clone())
        }
    }

    fn authenticator() -> Authenticator {
        Authenticator::new("id", LoginInfo::new("credentials", "john@doe.com"))
    }

    /// Instants with nanosecond precision, as the system clock yields them.
    fn instant() -> impl Strategy<Value = DateTime<Utc>> {
        (0i64..4_000_000_000, 0u32..1_000_000_000)
            .prop_map(|(secs, nanos)| DateTime::from_timestamp(secs, nanos).unwrap())
    }

    proptest! {
        #[test]
        fn test_touch_is_idempotent(t1 in instant(), t2 in instant()) {
            let twice = authenticator().touch(t1).touch(t2);
            let once = authenticator().touch(t2);
            prop_assert_eq!(twice, once);
        }

        #[test]
        fn test_tagged_with_subset(
            tags in proptest::collection::btree_set("[a-z]{1,6}", 0..6),
            take in 0usize..6,
        ) {
            let tagged = authenticator().with_tags(tags.iter());
            let subset: Vec<&String> = tags.iter().take(take).collect();
            prop_assert!(tagged.is_tagged_with(subset));
            prop_assert!(tagged.is_tagged_with(Vec::<String>::new()));
            prop_assert!(!tagged.is_tagged_with(tags.iter().chain(["UPPER".to_string()].iter())));
        }

        #[test]
        fn test_conjunction_concatenates_in_order(
            first in proptest::collection::vec("[a-z ]{1,12}", 0..3),
            second in proptest::collection::vec("[a-z ]{1,12}", 0..3),
        ) {
            let validators = Validators::new()
                .with(Fixed(Status::from_errors(first.clone())))
                .with(Fixed(Status::from_errors(second.clone())));
            let combined = tokio_test::block_on(validators.is_valid(&authenticator())).unwrap();

            let expected: Vec<String> = first.into_iter().chain(second).collect();
            prop_assert_eq!(combined.is_valid(), expected.is_empty());
            prop_assert_eq!(combined.errors(), expected.as_slice());
        }

        #[test]
        fn test_expiration_boundary(
            now in instant(),
            offset in -86_400_000_000_000i64..86_400_000_000_000,
        ) {
            let clock = FixedClock::new(now);
            let a = authenticator().with_expires(Some(now + Duration::nanoseconds(offset)));
            let validator = ExpirationValidator::new(clock);
            let status = tokio_test::block_on(validator.is_valid(&a)).unwrap();
            prop_assert_eq!(status.is_valid(), offset >= 0);
        }
    }
}
