//! Notebook archive decoding.
//!
//! An export is a zip archive. Members are recognized purely by the (case-sensitive)
//! extension of their base name:
//!
//! | Extension   | Role                       | Decoded into              |
//! |-------------|----------------------------|---------------------------|
//! | `.lines`    | [`Role::Strokes`]          | [`Notebook::pages`]       |
//! | `.content`  | [`Role::Metadata`]         | [`Notebook::content`]     |
//! | `.pagedata` | [`Role::Templates`]        | [`Page::template`]        |
//! | `.pdf`      | [`Role::Pdf`]              | [`Notebook::pdf`]         |
//! | `.epub`     | [`Role::Epub`]             | [`Notebook::epub`]        |
//! | `<n>.jpg`   | [`Role::Thumbnail`]        | [`Page::thumbnail`]       |
//!
//! Only the first member of each single-valued role is used. The notebook identifier
//! is the base name of the archive's first member, whatever its role.
//!
//! [`Page::template`]: crate::model::Page::template
//! [`Page::thumbnail`]: crate::model::Page::thumbnail

use crate::error::{Error, Result};
use crate::lines;
use crate::model::{Content, Notebook};
use std::fmt;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, trace, warn};
use zip::ZipArchive;

/// What an archive member contributes to the notebook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// `.lines` stroke data
    Strokes,
    /// `.content` JSON metadata
    Metadata,
    /// `.pagedata` template names, one per line
    Templates,
    /// Embedded PDF document
    Pdf,
    /// Embedded EPUB document
    Epub,
    /// Page thumbnail named after its page index
    Thumbnail,
}

/// Decodes one member's bytes into the notebook under construction
type MemberDecodeFn = fn(&str, Vec<u8>, &mut Notebook, &DecoderConfig) -> Result<()>;

impl Role {
    /// Single-valued roles, in the order they are processed.
    ///
    /// Stroke data comes first because templates and thumbnails are assigned to the
    /// pages it produces.
    pub const SINGLE: [Role; 5] = [
        Role::Strokes,
        Role::Metadata,
        Role::Templates,
        Role::Pdf,
        Role::Epub,
    ];

    /// Extension (with leading dot) identifying members of this role
    pub fn extension(self) -> &'static str {
        match self {
            Role::Strokes => ".lines",
            Role::Metadata => ".content",
            Role::Templates => ".pagedata",
            Role::Pdf => ".pdf",
            Role::Epub => ".epub",
            Role::Thumbnail => ".jpg",
        }
    }

    /// Returns true if the archive member name belongs to this role
    pub fn matches(self, member: &str) -> bool {
        !member.ends_with('/') && split_extension(base_name(member)).1 == self.extension()
    }

    fn decoder(self) -> MemberDecodeFn {
        match self {
            Role::Strokes => decode_strokes,
            Role::Metadata => decode_metadata,
            Role::Templates => decode_templates,
            Role::Pdf => decode_pdf,
            Role::Epub => decode_epub,
            Role::Thumbnail => decode_thumbnail,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Strokes => "stroke data",
            Role::Metadata => "metadata",
            Role::Templates => "template list",
            Role::Pdf => "pdf",
            Role::Epub => "epub",
            Role::Thumbnail => "thumbnail",
        };
        f.write_str(name)
    }
}

/// Configuration for the notebook decoder
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Keep default metadata instead of failing when `.content` is malformed
    pub lenient_metadata: bool,
    /// Read thumbnail members into their pages
    pub load_thumbnails: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            lenient_metadata: false,
            load_thumbnails: true,
        }
    }
}

impl DecoderConfig {
    /// Creates a new decoder config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether malformed metadata is tolerated
    pub fn lenient_metadata(mut self, lenient: bool) -> Self {
        self.lenient_metadata = lenient;
        self
    }

    /// Sets whether thumbnails are loaded
    pub fn load_thumbnails(mut self, load: bool) -> Self {
        self.load_thumbnails = load;
        self
    }
}

/// Decodes notebook archives
#[derive(Debug, Clone, Default)]
pub struct NotebookDecoder {
    config: DecoderConfig,
}

impl NotebookDecoder {
    /// Creates a new decoder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new decoder with custom configuration
    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Decodes a notebook from a random-access archive source
    pub fn decode<R: Read + Seek>(&self, reader: R) -> Result<Notebook> {
        let mut archive = ZipArchive::new(reader).map_err(Error::Archive)?;
        let members = member_names(&mut archive)?;

        let first = members.first().ok_or(Error::MissingArchiveFile)?;
        let mut notebook = Notebook::new(file_stem(first));
        debug!(
            "Decoding notebook '{}' from {} member(s)",
            notebook.id,
            members.len()
        );

        for role in Role::SINGLE {
            match members.iter().position(|name| role.matches(name)) {
                Some(index) => {
                    self.dispatch(&mut archive, role, index, &members[index], &mut notebook)?
                }
                None => trace!("No {} member", role),
            }
        }

        if self.config.load_thumbnails {
            for (index, name) in members.iter().enumerate() {
                if !Role::Thumbnail.matches(name) {
                    continue;
                }

                // Only in-range thumbnails are worth reading
                let page = thumbnail_index(name).map_err(|e| e.in_member(Role::Thumbnail, name))?;
                if page >= notebook.pages.len() {
                    debug!(
                        "Ignoring thumbnail '{}': notebook has {} page(s)",
                        name,
                        notebook.pages.len()
                    );
                    continue;
                }

                self.dispatch(&mut archive, Role::Thumbnail, index, name, &mut notebook)?;
            }
        }

        debug!(
            "Decoded notebook '{}': {} page(s), {} line(s), {} point(s)",
            notebook.id,
            notebook.pages.len(),
            notebook.line_count(),
            notebook.point_count()
        );
        Ok(notebook)
    }

    /// Decodes a notebook from an in-memory archive
    pub fn decode_bytes(&self, data: &[u8]) -> Result<Notebook> {
        self.decode(Cursor::new(data))
    }

    /// Reads a member fully and hands it to its role's decoder
    fn dispatch<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        role: Role,
        index: usize,
        member: &str,
        notebook: &mut Notebook,
    ) -> Result<()> {
        debug!("Processing {} member '{}'", role, member);

        let data = read_member(archive, index, member).map_err(|e| e.in_member(role, member))?;
        trace!("Read {} bytes from '{}'", data.len(), member);

        (role.decoder())(member, data, notebook, &self.config).map_err(|e| e.in_member(role, member))
    }
}

/// Decodes a notebook archive from disk with the default configuration
pub fn decode_file(path: impl AsRef<Path>) -> Result<Notebook> {
    decode_file_with_config(path, DecoderConfig::default())
}

/// Decodes a notebook archive from disk with custom configuration
pub fn decode_file_with_config(path: impl AsRef<Path>, config: DecoderConfig) -> Result<Notebook> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    NotebookDecoder::with_config(config).decode_bytes(&data)
}

/// Lists member names in central-directory order.
///
/// Uses raw access so members that are never dispatched are not decrypted or
/// decompressed here.
fn member_names<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
    (0..archive.len())
        .map(|index| {
            archive
                .by_index_raw(index)
                .map(|file| file.name().to_string())
                .map_err(|e| Error::member_open(format!("#{}", index), e))
        })
        .collect()
}

fn read_member<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    member: &str,
) -> Result<Vec<u8>> {
    let mut file = archive
        .by_index(index)
        .map_err(|e| Error::member_open(member, e))?;

    let mut data = Vec::new();
    file.read_to_end(&mut data)
        .map_err(|e| Error::member_open(member, e))?;
    Ok(data)
}

fn decode_strokes(
    _member: &str,
    data: Vec<u8>,
    notebook: &mut Notebook,
    _config: &DecoderConfig,
) -> Result<()> {
    notebook.pages = lines::decode_pages(&data)?;
    Ok(())
}

fn decode_metadata(
    member: &str,
    data: Vec<u8>,
    notebook: &mut Notebook,
    config: &DecoderConfig,
) -> Result<()> {
    match serde_json::from_slice::<Content>(&data) {
        Ok(content) => notebook.content = content,
        Err(e) if config.lenient_metadata => {
            warn!("Ignoring malformed metadata in '{}': {}", member, e);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn decode_templates(
    _member: &str,
    data: Vec<u8>,
    notebook: &mut Notebook,
    _config: &DecoderConfig,
) -> Result<()> {
    let text = String::from_utf8_lossy(&data);
    let mut assigned = 0;

    for (page, template) in notebook.pages.iter_mut().zip(text.lines()) {
        page.template = template.to_string();
        assigned += 1;
    }

    trace!(
        "Assigned {} template(s) to {} page(s)",
        assigned,
        notebook.pages.len()
    );
    Ok(())
}

fn decode_pdf(
    _member: &str,
    data: Vec<u8>,
    notebook: &mut Notebook,
    _config: &DecoderConfig,
) -> Result<()> {
    notebook.pdf = Some(data);
    Ok(())
}

fn decode_epub(
    _member: &str,
    data: Vec<u8>,
    notebook: &mut Notebook,
    _config: &DecoderConfig,
) -> Result<()> {
    notebook.epub = Some(data);
    Ok(())
}

fn decode_thumbnail(
    member: &str,
    data: Vec<u8>,
    notebook: &mut Notebook,
    _config: &DecoderConfig,
) -> Result<()> {
    let index = thumbnail_index(member)?;

    let page_count = notebook.pages.len();
    match notebook.pages.get_mut(index) {
        Some(page) => page.thumbnail = Some(data),
        None => debug!(
            "Ignoring thumbnail '{}': notebook has {} page(s)",
            member, page_count
        ),
    }
    Ok(())
}

/// Page index a thumbnail member is named after
fn thumbnail_index(member: &str) -> Result<usize> {
    file_stem(member)
        .parse()
        .map_err(|e| Error::thumbnail_index(member, e))
}

/// Last path component of a member name; directory entries keep their own name
fn base_name(member: &str) -> &str {
    let trimmed = member.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(slash) => &trimmed[slash + 1..],
        None => trimmed,
    }
}

/// Splits a base name into stem and extension, the extension keeping its dot
fn split_extension(base: &str) -> (&str, &str) {
    match base.rfind('.') {
        Some(dot) => base.split_at(dot),
        None => (base, ""),
    }
}

/// Base name of a member with its extension removed
fn file_stem(member: &str) -> &str {
    split_extension(base_name(member)).0
}
