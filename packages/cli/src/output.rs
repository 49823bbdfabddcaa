//! Plain-text rendering of the grid and map state.

use apartment_spot_filter::models::{Minimum, PredicateSet};
use apartment_spot_grid::GridView;
use apartment_spot_map::MapRenderer;
use apartment_spot_map::models::{Marker, MarkerPopup};
use apartment_spot_map::surface::MemorySurface;

pub fn print_filters(predicates: &PredicateSet, slider_max: f64) {
    if predicates.is_default() {
        println!("Filters: none");
        return;
    }

    let mut parts = Vec::new();
    if !predicates.query.is_empty() {
        parts.push(format!("query \"{}\"", predicates.query));
    }
    if !predicates.price.is_default() {
        parts.push(format!("price {}", predicates.price.label(slider_max)));
    }
    if let Minimum::AtLeast(n) = predicates.min_bedrooms {
        parts.push(format!("{n}+ bedrooms"));
    }
    if let Minimum::AtLeast(n) = predicates.min_bathrooms {
        parts.push(format!("{n}+ bathrooms"));
    }
    println!("Filters: {}", parts.join(", "));
}

pub fn print_grid(view: &GridView) {
    match view {
        GridView::Loading => println!("Loading listings..."),
        GridView::Empty => println!("No apartments match your search."),
        GridView::Cards(cards) => {
            println!("{} apartment(s)", cards.len());
            println!("{}", "-".repeat(72));
            for card in cards {
                println!("{:<8} {}", card.id, card.title);
                println!("         {}", card.address);
                println!(
                    "         {}/mo | {} | {} | Available: {}",
                    card.price_label, card.bedrooms_label, card.bathrooms_label, card.availability
                );
                println!("         {}", card.detail_path);
            }
        }
    }
}

pub fn print_map(renderer: &MapRenderer<MemorySurface>) {
    let viewport = renderer.viewport();
    println!(
        "Map ({}): center {:.4}, {:.4} zoom {}",
        renderer.state(),
        viewport.center.latitude,
        viewport.center.longitude,
        viewport.zoom
    );

    match renderer.user_marker() {
        Some(marker) => print_marker(marker),
        None => println!("  (no user location)"),
    }

    let count = renderer.listing_marker_count();
    println!("  {count} listing marker(s)");
    for marker in renderer.listing_markers() {
        print_marker(marker);
    }
}

fn print_marker(marker: &Marker) {
    let position = format!("{:>9.4}, {:>9.4}", marker.position.latitude, marker.position.longitude);
    match &marker.popup {
        MarkerPopup::UserLocation { text } => println!("  [{}] {position}  {text}", marker.icon),
        MarkerPopup::Listing(popup) => println!(
            "  [{}] {position}  {} | {} | {}",
            marker.icon, popup.title, popup.price_label, popup.detail_path
        ),
    }
}
