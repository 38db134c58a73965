//! Maildrop listing types.

/// Drop listing returned by STAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaildropStat {
    /// Number of messages in the maildrop.
    pub count: u32,
    /// Total size of the maildrop in octets.
    pub total_size: u64,
}

/// Scan listing entry returned by LIST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageSummary {
    /// Message number.
    pub id: u32,
    /// Message size in octets.
    pub size: u64,
}

impl MessageSummary {
    /// Splits a listing into parallel id and size vectors, preserving order.
    #[must_use]
    pub fn unzip(listing: &[Self]) -> (Vec<u32>, Vec<u64>) {
        listing.iter().map(|m| (m.id, m.size)).unzip()
    }
}

/// Unique-id listing entry returned by UIDL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueId {
    /// Message number.
    pub id: u32,
    /// Server-assigned persistent identifier.
    pub uid: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unzip_preserves_order() {
        let listing = [
            MessageSummary { id: 2, size: 40 },
            MessageSummary { id: 1, size: 10 },
        ];
        let (ids, sizes) = MessageSummary::unzip(&listing);
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(sizes, vec![40, 10]);
    }

    #[test]
    fn test_unzip_empty() {
        let (ids, sizes) = MessageSummary::unzip(&[]);
        assert!(ids.is_empty());
        assert!(sizes.is_empty());
    }
}
