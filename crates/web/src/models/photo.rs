//! Photo domain types.

use core::fmt;

use cat_collector_core::{CatId, PhotoId};

/// Maximum length of a stored photo URL.
pub const URL_MAX_CHARS: usize = 200;

/// A photo of a cat, hosted in external object storage.
///
/// Deleting the row does not delete the stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub id: PhotoId,
    pub cat_id: CatId,
    pub url: String,
}

impl fmt::Display for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Photo for cat_id: {} @{}", self.cat_id, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let photo = Photo {
            id: PhotoId::new(4),
            cat_id: CatId::new(2),
            url: "https://s3.us-east-1.amazonaws.com/catcollector/0123456789ab.png".to_owned(),
        };
        assert_eq!(
            photo.to_string(),
            "Photo for cat_id: 2 @https://s3.us-east-1.amazonaws.com/catcollector/0123456789ab.png"
        );
    }
}
