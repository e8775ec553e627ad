//! Object-File Section Import
//!
//! Registers the read-only sections of an executable image as read-only
//! regions, so the interpreter can fold loads from literal pools, constant
//! tables and GOT entries.
//!
//! # Section Selection
//! A section is imported when it is allocated at run time, not writable and
//! backed by file content (`SHT_NOBITS` sections such as `.bss` have no bytes).

use crate::runtime::context::AnalysisContext;
use anyhow::{Context, Result};
use goblin::elf::section_header::{SHF_ALLOC, SHF_WRITE, SHT_NOBITS};
use goblin::elf::Elf;

/// One loadable section with its file content.
#[derive(Debug, Clone, Copy)]
pub struct SectionImage<'a> {
    pub name: &'a str,
    /// Virtual address the section is loaded at
    pub address: u64,
    pub writable: bool,
    pub data: &'a [u8],
}

/// Register every non-writable section in `sections` with `ctx`.
///
/// Empty sections and sections at address 0 are skipped.
///
/// # Returns
/// `usize` - Number of sections registered
pub fn register_sections<'a>(
    ctx: &mut AnalysisContext,
    sections: impl IntoIterator<Item = SectionImage<'a>>,
) -> usize {
    let mut registered: usize = 0usize;
    for section in sections {
        if section.writable || section.data.is_empty() || section.address == 0u64 {
            continue;
        }
        if !ctx.register_readonly_region(section.address, section.data.len() as u64, section.data) {
            log::warn!("Could not register section {} at 0x{:x}", section.name, section.address);
            continue;
        }
        log::debug!(
            "Registered section {} at 0x{:x} ({} bytes)",
            section.name,
            section.address,
            section.data.len()
        );
        registered += 1usize;
    }
    registered
}

/// Parse an ELF image and register its read-only allocated sections.
///
/// # Arguments
/// * `ctx` - Context receiving the regions
/// * `bytes` - Complete ELF file content
///
/// # Returns
/// `Result<usize>` - Number of sections registered
///
/// # Errors
/// Returns error if the image is not a valid ELF file or a section header
/// points outside the file
///
/// # Examples
/// ```rust,ignore
/// let bytes = std::fs::read("target.elf")?;
/// let count = register_elf_sections(&mut ctx, &bytes)?;
/// ```
pub fn register_elf_sections(ctx: &mut AnalysisContext, bytes: &[u8]) -> Result<usize> {
    let elf: Elf<'_> = Elf::parse(bytes).context("Failed to parse ELF image")?;

    let mut images: Vec<SectionImage<'_>> = Vec::with_capacity(elf.section_headers.len());
    for header in &elf.section_headers {
        if header.sh_flags & (SHF_ALLOC as u64) == 0u64 || header.sh_type == SHT_NOBITS {
            continue;
        }
        let name: &str = elf.shdr_strtab.get_at(header.sh_name).unwrap_or("<unnamed>");
        let data: &[u8] = match header.file_range() {
            Some(range) => bytes
                .get(range)
                .with_context(|| format!("Section {} extends past the end of the file", name))?,
            None => continue,
        };
        images.push(SectionImage {
            name,
            address: header.sh_addr,
            writable: header.sh_flags & (SHF_WRITE as u64) != 0u64,
            data,
        });
    }

    let count: usize = register_sections(ctx, images);
    log::info!("Imported {} read-only sections", count);
    Ok(count)
}
