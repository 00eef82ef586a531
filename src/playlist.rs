// Playlist expansion for URL sources
// Flattens M3U/PLS playlists (possibly nested) into a list of media URLs

use std::io::Read;
use std::sync::Arc;

use crate::error::{PlayerError, Result};
use crate::fetch::HttpContentFetcherFactory;

/// Largest playlist body we are willing to parse.
const MAX_PLAYLIST_BYTES: u64 = 1024 * 1024;

/// How deep nested playlists may point at further playlists.
const MAX_PLAYLIST_DEPTH: usize = 4;

/// Expands a URL into the flat list of media URLs it stands for.
///
/// Runs on the URL preparation thread only; expansion blocks on the
/// fetcher and must never run on the dispatcher.
pub struct PlaylistExpander {
    factory: Arc<dyn HttpContentFetcherFactory>,
}

impl PlaylistExpander {
    pub fn new(factory: Arc<dyn HttpContentFetcherFactory>) -> Self {
        Self { factory }
    }

    /// Expand `url`. A URL that does not look like a playlist passes
    /// through as the single entry.
    pub fn expand(&self, url: &str) -> Result<Vec<String>> {
        let mut entries = Vec::new();
        self.expand_into(url, 0, &mut entries)?;
        if entries.is_empty() {
            return Err(PlayerError::PlaylistError(format!(
                "playlist expansion of {} produced no entries",
                url
            )));
        }
        log::info!("Expanded {} into {} entries", url, entries.len());
        Ok(entries)
    }

    fn expand_into(&self, url: &str, depth: usize, entries: &mut Vec<String>) -> Result<()> {
        if depth >= MAX_PLAYLIST_DEPTH || !looks_like_playlist(url) {
            entries.push(url.to_string());
            return Ok(());
        }

        let mut fetcher = self.factory.create(url);
        let content = fetcher.fetch()?;
        if !content.is_success() {
            return Err(PlayerError::PlaylistError(format!(
                "fetching playlist {} returned status {}",
                url, content.status
            )));
        }

        let mut body = String::new();
        content
            .body
            .take(MAX_PLAYLIST_BYTES)
            .read_to_string(&mut body)
            .map_err(|e| PlayerError::PlaylistError(format!("reading playlist {}: {}", url, e)))?;

        let parsed = if is_pls(url) {
            parse_pls(&body)
        } else {
            parse_m3u(&body)
        };
        for entry in parsed {
            let resolved = resolve_reference(url, &entry);
            self.expand_into(&resolved, depth + 1, entries)?;
        }
        Ok(())
    }
}

fn url_path(url: &str) -> &str {
    let without_fragment = url.split('#').next().unwrap_or(url);
    without_fragment.split('?').next().unwrap_or(without_fragment)
}

fn has_extension(url: &str, extension: &str) -> bool {
    url_path(url)
        .rsplit('/')
        .next()
        .map(|name| {
            name.rsplit('.')
                .next()
                .map(|ext| ext.eq_ignore_ascii_case(extension))
                .unwrap_or(false)
        })
        .unwrap_or(false)
}

fn is_pls(url: &str) -> bool {
    has_extension(url, "pls")
}

fn looks_like_playlist(url: &str) -> bool {
    has_extension(url, "m3u") || has_extension(url, "m3u8") || is_pls(url)
}

/// Plain and extended M3U: one entry per line, `#` lines are directives.
fn parse_m3u(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// PLS: `FileN=<url>` entries under a `[playlist]` section.
fn parse_pls(body: &str) -> Vec<String> {
    let mut numbered: Vec<(u32, String)> = Vec::new();
    for line in body.lines().map(str::trim) {
        let Some(rest) = line.strip_prefix("File").or_else(|| line.strip_prefix("file")) else {
            continue;
        };
        let Some((index, value)) = rest.split_once('=') else {
            continue;
        };
        let Ok(index) = index.trim().parse::<u32>() else {
            continue;
        };
        let value = value.trim();
        if !value.is_empty() {
            numbered.push((index, value.to_string()));
        }
    }
    numbered.sort_by_key(|(index, _)| *index);
    numbered.into_iter().map(|(_, value)| value).collect()
}

/// Resolve a playlist entry against the playlist URL. Absolute entries pass
/// through; relative ones are joined to the playlist's directory.
fn resolve_reference(base: &str, entry: &str) -> String {
    if entry.contains("://") {
        return entry.to_string();
    }
    if let Some(scheme_end) = base.find("://") {
        let authority_start = scheme_end + 3;
        if entry.starts_with('/') {
            let authority_end = base[authority_start..]
                .find('/')
                .map(|i| authority_start + i)
                .unwrap_or(base.len());
            return format!("{}{}", &base[..authority_end], entry);
        }
        let dir_end = base.rfind('/').filter(|&i| i >= authority_start);
        if let Some(dir_end) = dir_end {
            return format!("{}/{}", &base[..dir_end], entry);
        }
        return format!("{}/{}", base, entry);
    }
    entry.to_string()
}
