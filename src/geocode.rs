/// Lookup of geographic codes (FIPS6, UGC, ...) by name.
///
/// CAP 1.2 repeats one `<geocode>` element per name/value pair while the NWS Atom feed packs every
/// pair into a single element holding parallel name and value lists. Both [`crate::Area`] and
/// [`crate::AtomGeocode`] implement this trait so consumers can ask "which FIPS6 codes?" without
/// caring which document they came from.
pub trait Geocodes {
    /// The first code recorded under `name`, if any.
    fn geocode(&self, name: &str) -> Option<&str>;

    /// Every code recorded under `name`, in document order.
    fn geocode_all(&self, name: &str) -> Vec<&str>;

    fn has_geocode(&self, name: &str, code: &str) -> bool {
        self.geocode_all(name).contains(&code)
    }
}
