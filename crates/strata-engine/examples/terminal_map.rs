//! Terminal demo: place a few entities, pump the engine to idle, and print
//! the resulting layers as ASCII with their region labels.
//!
//! Run with: `cargo run --example terminal_map`
//! Set `RUST_LOG=debug` to watch the rebuild/refresh/label slices.

use anyhow::Result;

use strata_engine::prelude::*;

/// A presentation backend that renders into a character grid.
struct TerminalBackend {
    width: u32,
    height: u32,
    cells: Vec<Option<Rgba>>,
    labels: Vec<RegionLabel>,
}

impl TerminalBackend {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![None; (width * height) as usize],
            labels: Vec::new(),
        }
    }

    /// Rough luminance bucket, so different colors read differently even
    /// in plain text.
    fn glyph(color: Rgba) -> char {
        let luminance = 0.299 * color[0] + 0.587 * color[1] + 0.114 * color[2];
        match (luminance * 4.0) as u32 {
            0 => '#',
            1 => '%',
            2 => '+',
            _ => 'o',
        }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = self.cells[(y * self.width + x) as usize];
                out.push(cell.map_or('.', Self::glyph));
            }
            out.push('\n');
        }
        for label in &self.labels {
            out.push_str(&format!(
                "  [{}] at ({:.0}, {:.0}) px, {:.0} px wide ({} cells)\n",
                label.text,
                label.geometry.center_x,
                label.geometry.center_y,
                label.geometry.width,
                label.cell_count,
            ));
        }
        out
    }
}

impl PresentationBackend for TerminalBackend {
    fn show_cell(&mut self, x: u32, y: u32, color: Rgba) {
        self.cells[(y * self.width + x) as usize] = Some(color);
    }

    fn hide_cell(&mut self, x: u32, y: u32) {
        self.cells[(y * self.width + x) as usize] = None;
    }

    fn place_label(&mut self, label: &RegionLabel) {
        self.labels.push(label.clone());
    }

    fn clear_labels(&mut self) {
        self.labels.clear();
    }
}

fn build_templates() -> Result<MemoryTemplateStore> {
    let mut templates = MemoryTemplateStore::new();

    // A 4x3 kitchen: sector block plus a solid collision footprint.
    templates.insert(
        TemplateId(1),
        TemplateSheet::new()
            .with_layer(LayerKind::Sector, LocalGrid::filled(4, 3, 7))
            .with_names(LayerKind::Sector, [(7u32, "Kitchen")])
            .with_layer(LayerKind::Collision, LocalGrid::filled(4, 3, 1)),
    )?;

    // A 3x3 armory authored as text, with a hollow collision middle.
    templates.insert(
        TemplateId(2),
        TemplateSheet::new()
            .with_layer(LayerKind::Sector, parse_cell_rows("2,2,2\n2,2,2\n2,2,2\n")?)
            .with_names(LayerKind::Sector, parse_name_table("2,Armory\n"))
            .with_layer(
                LayerKind::Collision,
                parse_cell_rows("1,1,1\n1,0,1\n1,1,1\n")?,
            ),
    )?;

    // A 1x1 crate point object.
    templates.insert(
        TemplateId(3),
        TemplateSheet::new()
            .with_layer(LayerKind::GameObject, LocalGrid::filled(1, 1, 1))
            .with_names(LayerKind::GameObject, [(1u32, "Crate")])
            .with_layer(LayerKind::Collision, LocalGrid::filled(1, 1, 2)),
    )?;

    Ok(templates)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let geometry = MapGeometry::new(20, 12, 16.0);
    let templates = build_templates()?;

    let entities = vec![
        PlacedEntity {
            id: EntityId(1),
            kind: EntityKind::Structure,
            origin: Some((2, 2)),
            footprint_width: 4,
            footprint_height: 3,
            template: TemplateId(1),
        },
        PlacedEntity {
            id: EntityId(2),
            kind: EntityKind::Structure,
            origin: Some((11, 5)),
            footprint_width: 3,
            footprint_height: 3,
            template: TemplateId(2),
        },
        PlacedEntity {
            id: EntityId(3),
            kind: EntityKind::PointObject,
            origin: Some((7, 8)),
            footprint_width: 1,
            footprint_height: 1,
            template: TemplateId(3),
        },
    ];

    let mut backend = TerminalBackend::new(geometry.width, geometry.height);
    let mut engine = MapEngine::new(geometry, SliceBudget::default());
    engine.mark_dirty(None);

    for mode in [
        ViewMode::Layer(LayerKind::Sector),
        ViewMode::Layer(LayerKind::GameObject),
        ViewMode::Layer(LayerKind::Collision),
    ] {
        engine.set_mode(mode);
        engine.pump_to_idle(&entities, &templates, &mut backend);
        println!("== {:?} ==", mode);
        println!("{}", backend.render());
    }

    if let Some(report) = engine.last_report() {
        println!(
            "rebuild: {} entities, {} cells written",
            report.entities_seen, report.cells_written
        );
    }

    // The persisted form of the active layer and its name table.
    println!("-- sector export --");
    print!("{}", export_layer(engine.layers().layer(LayerKind::Sector)));
    print!(
        "{}",
        export_name_table(engine.layers().names(LayerKind::Sector).unwrap())
    );

    Ok(())
}
