//! services/api/src/adapters/catalog.rs
//!
//! Third-party ISBN catalogs implementing the `CatalogProvider` port:
//! Google Books, Open Library and the Deutsche Nationalbibliothek SRU endpoint.
//! Each adapter makes a single metadata request and reports "no match" as
//! `Ok(None)`. Cover images found on a match are downloaded and inlined as
//! `data:` URIs.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use book_tracker_core::domain::CatalogEntry;
use book_tracker_core::ports::{CatalogProvider, PortError, PortResult};
use quick_xml::{events::Event, Reader};
use regex::Regex;
use reqwest::{
    header::{CONTENT_TYPE, USER_AGENT},
    Client, StatusCode,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

const CLIENT_USER_AGENT: &str = "BookTracker/1.0";
const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_AUTHOR: &str = "Unknown Author";

fn unexpected(provider: &str, e: impl std::fmt::Display) -> PortError {
    PortError::Unexpected(format!("{}: {}", provider, e))
}

fn join_authors(authors: Vec<String>) -> String {
    let authors: Vec<String> = authors
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    if authors.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        authors.join(", ")
    }
}

fn title_or_default(title: Option<String>) -> String {
    title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

const FALLBACK_IMAGE_TYPE: &str = "image/jpeg";

/// Encodes image bytes as a `data:` URI. Non-image content types are reported as JPEG.
fn data_uri(content_type: Option<&str>, bytes: &[u8]) -> String {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|ct| ct.starts_with("image/"))
        .unwrap_or(FALLBACK_IMAGE_TYPE);
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

/// Downloads a cover and returns it inline, so stored books do not point at
/// third-party hosts. Any failure keeps the remote URL.
async fn inline_cover(client: &Client, url: String) -> String {
    let response = match client.get(&url).header(USER_AGENT, CLIENT_USER_AGENT).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            debug!(url = %url, status = %response.status(), "Cover download refused");
            return url;
        }
        Err(e) => {
            debug!(url = %url, error = %e, "Cover download failed");
            return url;
        }
    };
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    match response.bytes().await {
        Ok(bytes) if !bytes.is_empty() => data_uri(content_type.as_deref(), &bytes),
        Ok(_) => url,
        Err(e) => {
            debug!(url = %url, error = %e, "Cover download failed");
            url
        }
    }
}

async fn with_inline_cover(client: &Client, entry: Option<CatalogEntry>) -> Option<CatalogEntry> {
    let mut entry = entry?;
    if let Some(url) = entry.cover_image.take() {
        entry.cover_image = Some(inline_cover(client, url).await);
    }
    Some(entry)
}

//=========================================================================================
// Google Books
//=========================================================================================

pub struct GoogleBooksProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GoogleBooksProvider {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: "https://www.googleapis.com/books/v1/volumes".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct GoogleVolumes {
    #[serde(default)]
    items: Vec<GoogleVolume>,
}

#[derive(Deserialize)]
struct GoogleVolume {
    #[serde(rename = "volumeInfo")]
    volume_info: GoogleVolumeInfo,
}

#[derive(Deserialize)]
struct GoogleVolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(rename = "pageCount")]
    page_count: Option<u32>,
    #[serde(rename = "imageLinks")]
    image_links: Option<GoogleImageLinks>,
}

#[derive(Deserialize)]
struct GoogleImageLinks {
    thumbnail: Option<String>,
    #[serde(rename = "smallThumbnail")]
    small_thumbnail: Option<String>,
}

fn entry_from_google(isbn: &str, volumes: GoogleVolumes) -> Option<CatalogEntry> {
    let info = volumes.items.into_iter().next()?.volume_info;
    let cover_image = info
        .image_links
        .and_then(|links| links.thumbnail.or(links.small_thumbnail))
        .map(|url| url.replacen("http://", "https://", 1));

    Some(CatalogEntry {
        isbn: isbn.to_string(),
        title: title_or_default(info.title),
        author: join_authors(info.authors),
        cover_image,
        total_pages: info.page_count.unwrap_or(0),
    })
}

#[async_trait]
impl CatalogProvider for GoogleBooksProvider {
    fn name(&self) -> &'static str {
        "google_books"
    }

    async fn lookup(&self, isbn: &str) -> PortResult<Option<CatalogEntry>> {
        let mut query = vec![("q", format!("isbn:{}", isbn))];
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }

        let response = self
            .client
            .get(&self.base_url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .query(&query)
            .send()
            .await
            .map_err(|e| unexpected(self.name(), e))?;

        debug!(status = %response.status(), "Google Books responded");
        if !response.status().is_success() {
            // 403 and 429 mean the shared quota is exhausted.
            return Err(unexpected(self.name(), format!("HTTP {}", response.status())));
        }

        let volumes: GoogleVolumes = response
            .json()
            .await
            .map_err(|e| unexpected(self.name(), e))?;
        Ok(with_inline_cover(&self.client, entry_from_google(isbn, volumes)).await)
    }
}

//=========================================================================================
// Open Library
//=========================================================================================

pub struct OpenLibraryProvider {
    client: Client,
    base_url: String,
}

impl OpenLibraryProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: "https://openlibrary.org/api/books".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct OpenLibraryBook {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<OpenLibraryAuthor>,
    number_of_pages: Option<u32>,
    cover: Option<OpenLibraryCover>,
}

#[derive(Deserialize)]
struct OpenLibraryAuthor {
    name: String,
}

#[derive(Deserialize)]
struct OpenLibraryCover {
    large: Option<String>,
    medium: Option<String>,
}

fn entry_from_open_library(
    isbn: &str,
    mut books: HashMap<String, OpenLibraryBook>,
) -> Option<CatalogEntry> {
    let book = books.remove(&format!("ISBN:{}", isbn))?;
    Some(CatalogEntry {
        isbn: isbn.to_string(),
        title: title_or_default(book.title),
        author: join_authors(book.authors.into_iter().map(|a| a.name).collect()),
        cover_image: book.cover.and_then(|c| c.large.or(c.medium)),
        total_pages: book.number_of_pages.unwrap_or(0),
    })
}

#[async_trait]
impl CatalogProvider for OpenLibraryProvider {
    fn name(&self) -> &'static str {
        "open_library"
    }

    async fn lookup(&self, isbn: &str) -> PortResult<Option<CatalogEntry>> {
        let bibkeys = format!("ISBN:{}", isbn);
        let response = self
            .client
            .get(&self.base_url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .query(&[
                ("bibkeys", bibkeys.as_str()),
                ("jscmd", "data"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| unexpected(self.name(), e))?;

        if !response.status().is_success() {
            return Err(unexpected(self.name(), format!("HTTP {}", response.status())));
        }

        let books: HashMap<String, OpenLibraryBook> = response
            .json()
            .await
            .map_err(|e| unexpected(self.name(), e))?;
        Ok(with_inline_cover(&self.client, entry_from_open_library(isbn, books)).await)
    }
}

//=========================================================================================
// Deutsche Nationalbibliothek (SRU, Dublin Core records)
//=========================================================================================

pub struct NationalLibraryProvider {
    client: Client,
    base_url: String,
}

impl NationalLibraryProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: "https://services.dnb.de/sru/dnb".to_string(),
        }
    }
}

fn first_number_re() -> &'static Regex {
    static FIRST_NUMBER: OnceLock<Regex> = OnceLock::new();
    FIRST_NUMBER.get_or_init(|| Regex::new(r"\d+").unwrap())
}

/// Drops role annotations such as "[Verfasser]" and flips "Last, First".
fn clean_creator(raw: &str) -> String {
    let without_role = match raw.find('[') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    let name = without_role.trim();
    match name.split_once(", ") {
        Some((last, first)) if !first.contains(',') => format!("{} {}", first, last),
        _ => name.to_string(),
    }
}

/// Page count from a `dc:format` value such as "335 S." or "412 pages".
fn pages_from_format(format: &str) -> Option<u32> {
    if !(format.contains("S.") || format.to_lowercase().contains("pages")) {
        return None;
    }
    first_number_re().find(format)?.as_str().parse().ok()
}

#[derive(Clone, Copy, PartialEq)]
enum SruField {
    Records,
    Title,
    Creator,
    Format,
}

impl SruField {
    fn from_element(qname: &[u8], local_name: &[u8]) -> Option<Self> {
        match (qname, local_name) {
            (_, b"numberOfRecords") => Some(Self::Records),
            (b"dc:title", _) => Some(Self::Title),
            (b"dc:creator", _) => Some(Self::Creator),
            (b"dc:format", _) => Some(Self::Format),
            _ => None,
        }
    }
}

#[derive(Default)]
struct SruRecord {
    records: u32,
    titles: Vec<String>,
    creators: Vec<String>,
    formats: Vec<String>,
}

impl SruRecord {
    fn push(&mut self, field: SruField, value: String) {
        let value = value.trim().to_string();
        match field {
            SruField::Records => self.records = value.parse().unwrap_or(0),
            SruField::Title => self.titles.push(value),
            SruField::Creator => self.creators.push(value),
            SruField::Format => self.formats.push(value),
        }
    }
}

fn read_sru(body: &str) -> Result<SruRecord, quick_xml::Error> {
    let mut reader = Reader::from_str(body);
    reader.trim_text(true);

    let mut record = SruRecord::default();
    let mut current: Option<(SruField, String)> = None;
    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                current = SruField::from_element(e.name().as_ref(), e.local_name().as_ref())
                    .map(|field| (field, String::new()));
            }
            Event::Text(ref e) => {
                if let Some((_, text)) = current.as_mut() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some((_, text)) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some((field, text)) = current.take() {
                    record.push(field, text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(record)
}

fn entry_from_sru(isbn: &str, body: &str) -> Result<Option<CatalogEntry>, quick_xml::Error> {
    let record = read_sru(body)?;
    if record.records == 0 {
        return Ok(None);
    }

    // DNB titles carry the statement of responsibility after " / ".
    let title = record.titles.into_iter().next().map(|full| match full.split_once(" / ") {
        Some((title, _)) => title.trim().to_string(),
        None => full,
    });
    let authors = record.creators.iter().map(|c| clean_creator(c)).collect();
    let total_pages = record
        .formats
        .iter()
        .find_map(|f| pages_from_format(f))
        .unwrap_or(0);

    Ok(Some(CatalogEntry {
        isbn: isbn.to_string(),
        title: title_or_default(title),
        author: join_authors(authors),
        cover_image: None,
        total_pages,
    }))
}

#[async_trait]
impl CatalogProvider for NationalLibraryProvider {
    fn name(&self) -> &'static str {
        "dnb_sru"
    }

    async fn lookup(&self, isbn: &str) -> PortResult<Option<CatalogEntry>> {
        let query = format!("isbn={}", isbn);
        let response = self
            .client
            .get(&self.base_url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .query(&[
                ("version", "1.1"),
                ("operation", "searchRetrieve"),
                ("query", query.as_str()),
                ("recordSchema", "oai_dc"),
                ("maximumRecords", "1"),
            ])
            .send()
            .await
            .map_err(|e| unexpected(self.name(), e))?;

        match response.status() {
            StatusCode::OK => {}
            status => return Err(unexpected(self.name(), format!("HTTP {}", status))),
        }

        let body = response
            .text()
            .await
            .map_err(|e| unexpected(self.name(), e))?;
        entry_from_sru(isbn, &body).map_err(|e| unexpected(self.name(), e))
    }
}
