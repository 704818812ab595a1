mod items;
mod migrations;
