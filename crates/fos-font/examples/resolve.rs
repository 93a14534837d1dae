//! Example: resolve a few styles against the installed fonts
//!
//! Run with `RUST_LOG=fos_font=debug` to watch the cache at work. An optional
//! argument names a JSON configuration file.

use fos_font::{FontCache, FontConfig, GenericFamily, StyleDescriptor, SystemFonts};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => FontConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => FontConfig::default(),
    };
    let fonts = SystemFonts::from_config(&config);
    println!("{} faces installed", fonts.len());

    let cache = FontCache::new(fonts, config);

    let requests = [
        StyleDescriptor::builder().generic(GenericFamily::SansSerif).build()?,
        StyleDescriptor::builder().generic(GenericFamily::Serif).italic(true).build()?,
        StyleDescriptor::builder().generic(GenericFamily::Monospace).bold().size(13.0).build()?,
        StyleDescriptor::builder().families(["Helvetica", "Arial"]).build()?,
    ];

    for descriptor in &requests {
        match cache.get_or_resolve(descriptor) {
            Ok(handle) => println!(
                "{:?} -> {} ({}) synthetic bold={} italic={}",
                descriptor.cache_key(),
                handle.family(),
                handle.face_id(),
                handle.synthetic_bold(),
                handle.synthetic_italic()
            ),
            Err(e) => {
                println!("{:?} -> {}", descriptor.cache_key(), e);
                let handle = cache.resolve_last_resort(descriptor)?;
                println!("  last resort: {}", handle.family());
            }
        }
    }

    let base = &requests[0];
    for text in ["Привет", "漢字かな", "مرحبا"] {
        match cache.resolve_by_character_coverage(text.chars(), base) {
            Ok(handle) => println!("{text:?} -> {}", handle.family()),
            Err(e) => println!("{text:?} -> {e}"),
        }
    }

    for family in ["Arial", "DejaVu Sans"] {
        let traits = cache.traits_available(family)?;
        println!("{family}: {} variants", traits.len());
    }

    println!("{:?}", cache.stats());
    Ok(())
}
