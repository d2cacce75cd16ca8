#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    sqpr_analyser_lib::run();
}
