//! 페이지 소스 — 모니터링 대상 목록 조회
//!
//! [`PageSource`]는 사이클마다 모니터링할 페이지 목록을 제공하는 trait입니다.
//! 목록 조회 실패는 일시적 에러로 취급되어 스케줄러가 해당 사이클 전체를
//! 건너뜁니다 (부분 사이클 없음).

use std::future::Future;

use pagewarden_core::config::PageEntry;
use pagewarden_core::error::PlatformError;
use pagewarden_core::types::PageInfo;

/// 모니터링 대상 페이지 목록을 제공하는 trait
pub trait PageSource: Send + Sync + 'static {
    /// 현재 모니터링 대상 페이지 목록을 반환합니다.
    fn list_pages(&self) -> impl Future<Output = Result<Vec<PageInfo>, PlatformError>> + Send;
}

/// 설정 파일 기반 페이지 소스
///
/// `pagewarden.toml`의 `[[pages]]` 항목을 그대로 반환합니다.
/// 실운영에서 외부 저장소를 쓰려면 별도의 [`PageSource`] 구현으로 교체합니다.
pub struct ConfigPageSource {
    pages: Vec<PageInfo>,
}

impl ConfigPageSource {
    /// 설정 항목에서 페이지 소스를 생성합니다.
    pub fn new(entries: &[PageEntry]) -> Self {
        let pages = entries
            .iter()
            .map(|entry| PageInfo {
                id: entry.id.clone(),
                name: entry.name.clone(),
                access_token: entry.access_token.clone(),
            })
            .collect();
        Self { pages }
    }

    /// 등록된 페이지 수를 반환합니다.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl PageSource for ConfigPageSource {
    async fn list_pages(&self) -> Result<Vec<PageInfo>, PlatformError> {
        Ok(self.pages.clone())
    }
}

/// 테스트용 Mock 페이지 소스
#[cfg(test)]
pub struct MockPageSource {
    /// 반환할 페이지 목록
    pub pages: Vec<PageInfo>,
    /// 목록 조회 실패를 시뮬레이션할지 여부
    pub fail_listing: bool,
}

#[cfg(test)]
impl MockPageSource {
    /// 주어진 페이지 목록으로 mock 소스를 생성합니다.
    pub fn new(pages: Vec<PageInfo>) -> Self {
        Self {
            pages,
            fail_listing: false,
        }
    }

    /// 목록 조회가 실패하도록 설정합니다.
    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }
}

#[cfg(test)]
impl PageSource for MockPageSource {
    async fn list_pages(&self) -> Result<Vec<PageInfo>, PlatformError> {
        if self.fail_listing {
            return Err(PlatformError::Other("mock listing failure".to_owned()));
        }
        Ok(self.pages.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn config_source_returns_configured_pages() {
        let entries = vec![
            PageEntry {
                id: "page-1".to_owned(),
                name: "Acme Coffee".to_owned(),
                access_token: "tok-1".to_owned(),
            },
            PageEntry {
                id: "page-2".to_owned(),
                name: "Acme Tea".to_owned(),
                access_token: "tok-2".to_owned(),
            },
        ];
        let source = ConfigPageSource::new(&entries);
        assert_eq!(source.page_count(), 2);

        let pages = source.list_pages().await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].id, "page-1");
        assert_eq!(pages[1].name, "Acme Tea");
    }

    #[tokio::test]
    async fn config_source_empty_entries() {
        let source = ConfigPageSource::new(&[]);
        let pages = source.list_pages().await.unwrap();
        assert!(pages.is_empty());
    }

    #[tokio::test]
    async fn mock_source_failure() {
        let source = MockPageSource::new(Vec::new()).with_failing_listing();
        assert!(source.list_pages().await.is_err());
    }
}
