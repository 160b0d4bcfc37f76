use crate::model::PriceFilter;

/// Price predicate.
///
/// Ranges are exclusive on both ends and a missing bound is open; an exact
/// amount requires equality. Listings without a price never match.
pub fn matches(filter: &PriceFilter, price: Option<f64>) -> bool {
    let Some(price) = price else {
        return false;
    };
    match *filter {
        PriceFilter::Exact(want) => price == want,
        PriceFilter::Range { min, max } => {
            min.is_none_or(|lo| price > lo) && max.is_none_or(|hi| price < hi)
        }
    }
}
