use rayon::prelude::*;

use crate::{
    arena::model::Arena,
    arena::packed::PACKED_SUFFIX,
    foundation::error::{ChoreoError, ChoreoResult},
    pack::config::PackConfig,
    pack::page::{Offer, Page, PageBuilder, validate_page},
};

/// Logical animation name of page `index` of `anim`.
pub fn page_name(anim: &str, index: usize) -> String {
    format!("{anim}-{index:02x}")
}

/// File name of page `index` of `anim`.
pub fn page_file_name(anim: &str, index: usize) -> String {
    format!("{}{PACKED_SUFFIX}", page_name(anim, index))
}

/// Split an arena's frame sequence into pages no larger than `config.page_limit`.
///
/// Every emitted page has been re-parsed and checked for tween locality.
#[tracing::instrument(skip(arena, config), fields(frames = arena.frame_count()))]
pub fn split(arena: &Arena, config: &PackConfig) -> ChoreoResult<Vec<Page>> {
    config.validate()?;
    let frames = arena.frames();
    let mut pages = Vec::new();
    let mut builder = PageBuilder::new(arena, config.page_limit, 0, 0);
    let mut i = 0usize;

    while i < frames.len() {
        match builder.offer(frames[i])? {
            Offer::Accepted => i += 1,
            Offer::Rewind(n) => {
                i -= n;
                let next = PageBuilder::new(arena, config.page_limit, pages.len() + 1, i);
                let done = std::mem::replace(&mut builder, next);
                pages.push(finish_page(done, config)?);
            }
        }
    }
    if !builder.is_empty() {
        pages.push(finish_page(builder, config)?);
    }

    tracing::info!(pages = pages.len(), "animation split");
    Ok(pages)
}

fn finish_page(builder: PageBuilder<'_>, config: &PackConfig) -> ChoreoResult<Page> {
    let page = builder.finish(config.byte_order)?;
    validate_page(&page.bytes, config.byte_order, config.page_limit, page.index)?;
    tracing::debug!(
        page = page.index,
        frames = page.frame_count(),
        bytes = page.len(),
        "page finalized"
    );
    Ok(page)
}

/// Split several named animations in parallel. Results keep input order.
pub fn split_many(
    inputs: &[(String, Arena)],
    config: &PackConfig,
) -> ChoreoResult<Vec<(String, Vec<Page>)>> {
    config.validate()?;
    let pool = build_thread_pool(config.threads)?;
    let results = pool.install(|| {
        inputs
            .par_iter()
            .map(|(name, arena)| {
                split(arena, config)
                    .map(|pages| (name.clone(), pages))
                    .map_err(|e| e.in_animation(name.clone()))
            })
            .collect::<Vec<_>>()
    });

    let mut out = Vec::with_capacity(results.len());
    for item in results {
        out.push(item?);
    }
    Ok(out)
}

fn build_thread_pool(threads: Option<usize>) -> ChoreoResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ChoreoError::config(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/pack/packer.rs"]
mod tests;
