//! `RemoteStore`: the async interface the core consumes to talk to the drive.
//!
//! Implementations wrap a real cloud API; the core only ever sees opaque ids,
//! names and bytes. Child listings are paginated; `child_pages` turns the
//! token-driven protocol into a finite stream of pages.

use async_trait::async_trait;
use futures_util::stream::{Stream, TryStreamExt, try_unfold};
use std::pin::pin;

use crate::error::Result;

/// Opaque identifier issued by the remote store; stable across rename/move.
pub type ObjectId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Directory,
    File,
}

/// One child as reported by a listing page.
#[derive(Clone, Debug)]
pub struct RemoteEntry {
    pub id: ObjectId,
    pub name: String,
    pub kind: ObjectKind,
    /// Server-side document format with no fixed byte representation;
    /// content is only reachable through an export/conversion path.
    pub native_doc: bool,
}

/// Result of a metadata fetch. `size` is `None` for native documents,
/// which have no byte size until exported.
#[derive(Clone, Debug)]
pub struct RemoteMetadata {
    pub name: String,
    pub kind: ObjectKind,
    pub size: Option<u64>,
    pub native_doc: bool,
}

/// One page of a child listing plus the continuation token, if any.
#[derive(Clone, Debug)]
pub struct ListPage {
    pub entries: Vec<RemoteEntry>,
    pub next: Option<String>,
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Id of the drive's root directory.
    async fn root_id(&self) -> Result<ObjectId>;

    /// One page of `dir_id`'s children. `page_token` of `None` requests the
    /// first page; subsequent pages use the token from the previous one.
    async fn list_children(&self, dir_id: &str, page_token: Option<&str>) -> Result<ListPage>;

    async fn create_directory(&self, name: &str, parent_id: &str) -> Result<ObjectId>;

    async fn create_file(&self, name: &str, parent_id: &str) -> Result<ObjectId>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Reparent `id`. A call with `from_parent == to_parent` is a no-op.
    async fn move_object(&self, id: &str, from_parent: &str, to_parent: &str) -> Result<()>;

    async fn set_name(&self, id: &str, new_name: &str) -> Result<()>;

    async fn get_metadata(&self, id: &str) -> Result<RemoteMetadata>;

    /// Whole-object content: raw bytes for ordinary files, exported bytes for
    /// native documents. Range reads are not part of the protocol.
    async fn open_content(&self, id: &str) -> Result<Vec<u8>>;

    /// Whole-object replace. There is no byte-range upload.
    async fn replace_content(&self, id: &str, data: &[u8]) -> Result<()>;
}

/// Lazy, finite stream of listing pages for `dir_id`, terminated by the
/// absence of a continuation token. A failed page fails the stream; callers
/// that need all-or-nothing semantics must discard partial output.
pub fn child_pages<'a, R>(
    remote: &'a R,
    dir_id: &'a str,
) -> impl Stream<Item = Result<Vec<RemoteEntry>>> + 'a
where
    R: RemoteStore + ?Sized,
{
    // State: Some(None) before the first page, Some(Some(tok)) between pages,
    // None when the remote reports no further token.
    try_unfold(Some(None::<String>), move |state| async move {
        let Some(token) = state else { return Ok(None) };
        let page = remote.list_children(dir_id, token.as_deref()).await?;
        Ok(Some((page.entries, page.next.map(Some))))
    })
}

/// Collect every child of `dir_id`, preserving page concatenation order.
pub async fn list_all_children<R>(remote: &R, dir_id: &str) -> Result<Vec<RemoteEntry>>
where
    R: RemoteStore + ?Sized,
{
    let mut out = Vec::new();
    let mut pages = pin!(child_pages(remote, dir_id));
    while let Some(page) = pages.try_next().await? {
        out.extend(page);
    }
    Ok(out)
}
