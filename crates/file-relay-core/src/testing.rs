//! Testing helpers and mock utilities.
//!
//! Convenient constructors for mocked link stores and transports.

use crate::model::LinkRecord;
use crate::storage::{MockLinkStore, StorageError};
use crate::transport::MockMediaTransport;

/// Mock store that knows exactly one record.
///
/// `find_link` returns the record for its token and `None` otherwise,
/// `increment_access` succeeds for any token.
#[must_use]
pub fn mock_store_with(record: LinkRecord) -> MockLinkStore {
    let mut mock = MockLinkStore::new();
    let token = record.link_token.clone();

    mock.expect_find_link().returning(move |t| {
        Ok((t == token).then(|| record.clone()))
    });

    mock.expect_increment_access().returning(|_| Ok(()));

    mock.expect_check_connection().returning(|| Ok(()));

    mock
}

/// Mock store whose writes always fail.
#[must_use]
pub fn mock_store_failing_writes() -> MockLinkStore {
    let mut mock = MockLinkStore::new();

    mock.expect_upsert_link()
        .returning(|_| Err(StorageError::Config("store offline".into())));

    mock.expect_increment_access()
        .returning(|_| Err(StorageError::Config("store offline".into())));

    mock
}

/// Mock transport that accepts every file.
#[must_use]
pub fn mock_transport_ok() -> MockMediaTransport {
    let mut mock = MockMediaTransport::new();
    mock.expect_send_media().returning(|_, _| Ok(()));
    mock
}
