pub mod health;
pub mod menu_items;
pub mod menus;
pub mod url_items;
