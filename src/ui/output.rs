use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(icon: &str, text: &str) {
    println!("{} {}", icon, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn empty(what: &str) {
    println!("{} No {} found.", Icons::EMPTY, what);
}

/// Price with two decimals; negative amounts are refunds
pub fn amount(price: f64) -> String {
    let text = format!("{:.2}", price);
    if price < 0.0 {
        text.style(theme().refund.clone()).to_string()
    } else {
        text.style(theme().expense.clone()).to_string()
    }
}
