//! On-disk dataset fixtures shared by the trainer and evaluator tests.

use std::path::Path;

use image::{Rgb, RgbImage};

use crate::config::Config;

/// One manifest row: identifier, tag values, and a solid fill color.
pub(crate) struct FixtureRow<'a> {
    pub name: &'a str,
    pub types: &'a [&'a str],
    pub color: [u8; 3],
}

/// Write `<root>/<split>/images.csv` and one PNG per row.
pub(crate) fn write_split(root: &Path, split: &str, rows: &[FixtureRow<'_>]) {
    let dir = root.join(split);
    let images = dir.join("images");
    std::fs::create_dir_all(&images).unwrap();

    let mut csv = String::from("Name,Type1,Type2\n");
    for row in rows {
        let type1 = row.types.first().copied().unwrap_or("");
        let type2 = row.types.get(1).copied().unwrap_or("");
        csv.push_str(&format!("{},{},{}\n", row.name, type1, type2));
        RgbImage::from_pixel(10, 10, Rgb(row.color))
            .save(images.join(format!("{}.png", row.name)))
            .unwrap();
    }
    std::fs::write(dir.join("images.csv"), csv).unwrap();
}

/// Small-image config rooted at `root`.
pub(crate) fn config_for(root: &Path, epochs: usize) -> Config {
    let mut config = Config::default();
    config.dataset.root = root.to_path_buf();
    config.dataset.name = Some("toy".to_string());
    config.image.width = 8;
    config.image.height = 8;
    config.model.pool_size = 4;
    config.model.learning_rate = 0.05;
    config.loading.parallel_workers = 3;
    config.training.epochs = epochs;
    config
}

/// Bright images are "Light", dark images are "Dark".
pub(crate) fn light_dark_rows() -> Vec<FixtureRow<'static>> {
    vec![
        FixtureRow { name: "sun", types: &["Light"], color: [240, 240, 240] },
        FixtureRow { name: "cave", types: &["Dark"], color: [10, 10, 10] },
        FixtureRow { name: "lamp", types: &["Light"], color: [230, 220, 230] },
        FixtureRow { name: "night", types: &["Dark"], color: [20, 15, 25] },
    ]
}
