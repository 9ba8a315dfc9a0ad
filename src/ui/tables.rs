use eframe::egui::{self, Align, Layout, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::Table;
use crate::state::LoadedTable;
use crate::ui::panels;

/// Height of the scrollable table body.
const TABLE_HEIGHT: f32 = 320.0;

/// Render one dataset section: heading plus either the table or its banner.
pub fn dataset_section(ui: &mut Ui, loaded: &LoadedTable) {
    match (&loaded.table, &loaded.banner) {
        (Some(table), _) => {
            ui.heading(format!("{} – {}", loaded.title, loaded.file_name));
            ui.label(format!(
                "{} rows × {} columns",
                table.len(),
                table.columns.len()
            ));
            if table.is_empty() {
                ui.weak("The file has a header but no rows.");
            } else {
                ui.push_id(&loaded.file_name, |ui: &mut Ui| data_table(ui, table));
            }
        }
        (None, Some(banner)) => panels::banner(ui, banner),
        (None, None) => {}
    }
}

/// Scrollable, striped grid of every cell in the table.
fn data_table(ui: &mut Ui, table: &Table) {
    let text_height = egui::TextStyle::Body.resolve(ui.style()).size;

    ScrollArea::horizontal()
        .id_salt("table_hscroll")
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .vscroll(true)
                .max_scroll_height(TABLE_HEIGHT)
                .cell_layout(Layout::left_to_right(Align::Center))
                .column(Column::auto().at_least(40.0))
                .columns(
                    Column::auto().at_least(60.0).clip(true),
                    table.columns.len(),
                )
                .header(24.0, |mut header| {
                    header.col(|ui| {
                        ui.label(RichText::new("#").weak());
                    });
                    for name in &table.columns {
                        header.col(|ui| {
                            ui.strong(name.as_str());
                        });
                    }
                })
                .body(|body| {
                    body.rows(text_height + 8.0, table.len(), |mut row| {
                        let row_idx = row.index();
                        row.col(|ui| {
                            ui.label(RichText::new(row_idx.to_string()).weak());
                        });
                        for cell in &table.rows[row_idx] {
                            row.col(|ui| {
                                let text = cell.display_text();
                                if cell.is_numeric() {
                                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                        ui.monospace(text);
                                    });
                                } else {
                                    ui.label(text);
                                }
                            });
                        }
                    });
                });
        });
}
