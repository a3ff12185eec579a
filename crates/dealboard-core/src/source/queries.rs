//! GraphQL documents sent to monday.com

/// One page of items plus the board's column definitions
///
/// `$cursor` is null on the first page.
pub(crate) const BOARD_ITEMS_PAGE: &str = r#"
query BoardItemsPage($boardIds: [ID!], $limit: Int!, $cursor: String) {
  boards(ids: $boardIds) {
    id
    name
    columns {
      id
      title
      type
    }
    items_page(limit: $limit, cursor: $cursor) {
      cursor
      items {
        id
        name
        created_at
        group {
          id
          title
        }
        column_values {
          id
          type
          text
          ... on StatusValue {
            label
            index
          }
          ... on NumbersValue {
            number
          }
          ... on DateValue {
            date
            time
          }
          ... on LinkValue {
            url
          }
          ... on EmailValue {
            email
          }
          ... on PhoneValue {
            phone
          }
        }
      }
    }
  }
}
"#;
