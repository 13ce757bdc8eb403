use crate::models::{EntityRef, ListQuery, ViewParameters};

/// The minimal tuple of view parameters that determines a list fetch.
///
/// Keys compare by value; the list resource refetches only when the derived
/// key differs from the last one it fetched for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub entity_id: String,
    pub entity_type: String,
    pub limit: u32,
    pub offset: u64,
    pub sort: String,
}

impl RequestKey {
    pub fn derive(params: &ViewParameters) -> Self {
        Self {
            entity_id: params.entity_id.clone(),
            entity_type: params.entity_type.clone(),
            limit: params.limit,
            offset: params.offset(),
            sort: params.sort.clone(),
        }
    }

    pub fn entity(&self) -> EntityRef {
        EntityRef::new(self.entity_id.clone(), self.entity_type.clone())
    }

    pub fn query(&self) -> ListQuery {
        ListQuery {
            limit: self.limit,
            offset: self.offset,
            sort: self.sort.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ViewParameters {
        ViewParameters::new(&EntityRef::new("e61fd249", "site"))
    }

    #[test]
    fn test_equal_parameters_give_equal_keys() {
        assert_eq!(RequestKey::derive(&params()), RequestKey::derive(&params()));
    }

    #[test]
    fn test_key_ignores_filters() {
        let base = params();
        let mut filtered = params();
        filtered.file_type = Some("pdf".to_string());
        filtered.name = Some("invoice".to_string());

        assert_eq!(RequestKey::derive(&base), RequestKey::derive(&filtered));
    }

    #[test]
    fn test_key_tracks_every_fetch_input() {
        let base = RequestKey::derive(&params());

        let mut p = params();
        p.entity_id = "other".to_string();
        assert_ne!(RequestKey::derive(&p), base);

        let mut p = params();
        p.entity_type = "customer".to_string();
        assert_ne!(RequestKey::derive(&p), base);

        let mut p = params();
        p.sort = "-creationTime".to_string();
        assert_ne!(RequestKey::derive(&p), base);

        let mut p = params();
        p.page = 2;
        assert_ne!(RequestKey::derive(&p), base);

        let mut p = params();
        p.limit = 20;
        assert_ne!(RequestKey::derive(&p), base);
    }

    #[test]
    fn test_key_carries_list_query() {
        let mut a = params();
        a.limit = 20;
        a.page = 3;
        let mut b = params();
        b.limit = 20;
        b.page = 3;
        b.name = Some("ignored".to_string());

        let key = RequestKey::derive(&a);
        assert_eq!(key, RequestKey::derive(&b));
        assert_eq!(key.offset, 40);
        assert_eq!(
            key.query(),
            ListQuery {
                limit: 20,
                offset: 40,
                sort: "name".to_string()
            }
        );
    }
}
