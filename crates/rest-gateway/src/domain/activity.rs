//! Batch "has this address ever transacted" check.

use crate::domain::address::split_payload;
use crate::domain::error::QueryError;
use crate::domain::types::AddressActivity;
use crate::ports::ActivityIndex;
use tracing::{debug, instrument};

/// Activity flags for `addresses`, in input order.
///
/// Every entry must contain exactly one `prefix:payload` separator; one malformed
/// entry fails the whole batch before the index is queried. The index is
/// asked for the inactive subset and every other payload counts as active.
#[instrument(skip_all, fields(batch = addresses.len()))]
pub async fn check_active(
    index: &dyn ActivityIndex,
    addresses: &[String],
) -> Result<Vec<AddressActivity>, QueryError> {
    let payloads = addresses
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            split_payload(raw)
                .map(|(_, payload)| payload.to_string())
                .map_err(|source| QueryError::InvalidAddress { index: i, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if payloads.is_empty() {
        return Ok(Vec::new());
    }

    let inactive = index.inactive_payloads(&payloads).await?;
    debug!(inactive = inactive.len(), "activity batch resolved");

    Ok(addresses
        .iter()
        .zip(&payloads)
        .map(|(address, payload)| AddressActivity {
            address: address.clone(),
            active: !inactive.contains(payload),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::address::AddressError;
    use crate::domain::error::UpstreamError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    /// Returns a fixed inactive set in reverse order and records the calls.
    #[derive(Default)]
    struct ScriptedIndex {
        inactive: Vec<&'static str>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl ActivityIndex for ScriptedIndex {
        async fn inactive_payloads(
            &self,
            payloads: &[String],
        ) -> Result<HashSet<String>, UpstreamError> {
            self.calls.lock().push(payloads.to_vec());
            Ok(self
                .inactive
                .iter()
                .rev()
                .filter(|p| payloads.iter().any(|q| q.as_str() == **p))
                .map(|p| p.to_string())
                .collect())
        }
    }

    fn batch(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_order_follows_input() {
        let index = ScriptedIndex {
            inactive: vec!["bbb"],
            ..Default::default()
        };
        let result = check_active(&index, &batch(&["kaspa:aaa", "kaspa:bbb", "kaspa:ccc"]))
            .await
            .unwrap();

        let flags: Vec<_> = result.iter().map(|r| (r.address.as_str(), r.active)).collect();
        assert_eq!(
            flags,
            vec![("kaspa:aaa", true), ("kaspa:bbb", false), ("kaspa:ccc", true)]
        );
    }

    #[tokio::test]
    async fn test_lookup_uses_payload_only() {
        let index = ScriptedIndex::default();
        check_active(&index, &batch(&["kaspa:aaa", "kaspatest:bbb"]))
            .await
            .unwrap();
        assert_eq!(index.calls.lock()[0], batch(&["aaa", "bbb"]));
    }

    #[tokio::test]
    async fn test_malformed_entry_fails_before_query() {
        let index = ScriptedIndex::default();
        let err = check_active(&index, &batch(&["kaspa:aaa", "garbage"]))
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::InvalidAddress { index: 1, .. }));
        assert!(index.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_second_separator_fails_batch() {
        let index = ScriptedIndex::default();
        let err = check_active(&index, &batch(&["kaspa:aaa:bbb", "kaspa:ccc"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            QueryError::InvalidAddress {
                index: 0,
                source: AddressError::ExtraSeparator(_)
            }
        ));
        assert!(index.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_skips_query() {
        let index = ScriptedIndex::default();
        let result = check_active(&index, &[]).await.unwrap();
        assert!(result.is_empty());
        assert!(index.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_addresses_both_reported() {
        let index = ScriptedIndex {
            inactive: vec!["aaa"],
            ..Default::default()
        };
        let result = check_active(&index, &batch(&["kaspa:aaa", "kaspa:aaa"]))
            .await
            .unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|r| !r.active));
    }
}
