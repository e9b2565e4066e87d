use cellsync_shared::{AttrId, AttrSchema, AttrSpec, BuiltinSymbol, SchemaId, SeriesSpec, Symbol};

pub const GALLERY_SCHEMA: SchemaId = 1;
pub const PHOTO_SCHEMA: SchemaId = 2;

pub const TITLE_ATTR: AttrId = 1;
pub const VIEWS_ATTR: AttrId = 2;
pub const SAMPLES_ATTR: AttrId = 3;

/// Definitions of a small photo gallery: galleries with a title, a view
/// counter and a time series of samples, holding titled photos
pub fn gallery_defs() -> (Vec<Symbol>, Vec<AttrSchema>) {
    let symbols = vec![
        Symbol::new(300, "gallery"),
        Symbol::new(301, "photo"),
    ];
    let gallery = AttrSchema::new(GALLERY_SCHEMA, "app://gallery")
        .with_attr(AttrSpec::new(TITLE_ATTR, BuiltinSymbol::Text.id(), SeriesSpec::None, "title"))
        .with_attr(AttrSpec::new(VIEWS_ATTR, BuiltinSymbol::Int.id(), SeriesSpec::None, "views"))
        .with_attr(AttrSpec::new(
            SAMPLES_ATTR,
            BuiltinSymbol::Float.id(),
            SeriesSpec::TimeIndex,
            "samples",
        ));
    let photo = AttrSchema::new(PHOTO_SCHEMA, "app://photo")
        .with_attr(AttrSpec::new(TITLE_ATTR, BuiltinSymbol::Text.id(), SeriesSpec::None, "title"));
    (symbols, vec![gallery, photo])
}
