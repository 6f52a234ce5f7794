use std::fmt::Display;
use std::path::{Path, PathBuf};

use log::info;
use plotters::prelude::*;

use crate::config::PlotConfig;
use crate::dataset::{Column, DataTable};
use crate::error::PlotError;
use crate::types::{ColumnMatch, PlotDisplay};

/// 格式化数字为固定宽度的 y 轴标签
fn format_fixed_width_y_label(value: f64) -> String {
    let abs_value = value.abs();
    if abs_value >= 1000.0 {
        format!("{:-6.1e}", value)
    } else if abs_value >= 100.0 {
        format!("{:-6.0}", value)
    } else if abs_value >= 10.0 {
        format!("{:-6.1}", value)
    } else {
        format!("{:-6.2}", value)
    }
}

fn backend_error<E: Display>(e: E) -> PlotError {
    PlotError::Backend(e.to_string())
}

/// Value range padded by 10% of its span, as the exploratory plots use.
fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let span = max - min;
    if span <= 0.0 {
        return (min - 0.5, max + 0.5);
    }
    (min - 0.1 * span, max + 0.1 * span)
}

/// Saves exploratory figures of a [`DataTable`] as numbered SVG files.
#[derive(Debug)]
pub struct DatasetPlotter {
    figures_dir: PathBuf,
    config: PlotConfig,
    plot_number: usize,
}

impl DatasetPlotter {
    pub fn new<P: Into<PathBuf>>(figures_dir: P, config: PlotConfig) -> Result<Self, PlotError> {
        let figures_dir = figures_dir.into();
        std::fs::create_dir_all(&figures_dir)?;
        Ok(Self {
            figures_dir,
            config,
            plot_number: 1,
        })
    }

    pub fn figures_dir(&self) -> &Path {
        &self.figures_dir
    }

    fn next_figure_path(&mut self) -> PathBuf {
        let path = self.figures_dir.join(format!("figure_{}.svg", self.plot_number));
        self.plot_number += 1;
        path
    }

    fn color(&self, index: usize) -> RGBColor {
        match self.config.palette.len() {
            0 => BLACK,
            n => {
                let [r, g, b] = self.config.palette[index % n];
                RGBColor(r, g, b)
            }
        }
    }

    /// Box plot of the given columns side by side.
    pub fn plot_dataset_boxplot(&mut self, table: &DataTable, columns: &[String]) -> Result<PathBuf, PlotError> {
        if columns.is_empty() {
            return Err(PlotError::NoData("boxplot".to_string()));
        }

        let mut quartiles = Vec::with_capacity(columns.len());
        for name in columns {
            let column = table
                .column(name)
                .ok_or_else(|| PlotError::UnknownColumn(name.clone()))?;
            let values = column.non_missing();
            if values.is_empty() {
                return Err(PlotError::NoData(name.clone()));
            }
            quartiles.push(Quartiles::new(values.as_slice()));
        }

        let (lo, hi) = quartiles
            .iter()
            .flat_map(|q| q.values())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v as f64), hi.max(v as f64))
            });
        let (y_min, y_max) = padded_range(lo, hi);

        let path = self.next_figure_path();
        {
            let root = SVGBackend::new(&path, (self.config.width, self.config.height)).into_drawing_area();
            root.fill(&WHITE).map_err(backend_error)?;

            let count = columns.len() as u32;
            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .x_label_area_size(40)
                .y_label_area_size(70)
                .build_cartesian_2d((0..count).into_segmented(), y_min as f32..y_max as f32)
                .map_err(backend_error)?;

            let x_label = |v: &SegmentValue<u32>| match v {
                SegmentValue::CenterOf(i) => columns.get(*i as usize).cloned().unwrap_or_default(),
                _ => String::new(),
            };
            let y_label = |v: &f32| format_fixed_width_y_label(*v as f64);

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(columns.len())
                .x_label_formatter(&x_label)
                .y_label_formatter(&y_label)
                .y_desc("value")
                .draw()
                .map_err(backend_error)?;

            let color = self.color(0);
            chart
                .draw_series(quartiles.iter().enumerate().map(|(i, q)| {
                    Boxplot::new_vertical(SegmentValue::CenterOf(i as u32), q)
                        .width(40)
                        .whisker_width(0.5)
                        .style(color)
                }))
                .map_err(backend_error)?;

            root.present().map_err(backend_error)?;
        }

        info!("Saved boxplot of {} columns to {}", columns.len(), path.display());
        Ok(path)
    }

    /// One stacked panel per entry of `columns`.
    ///
    /// `matches[i]` decides whether `columns[i]` names one column (`Exact`) or a
    /// prefix of several (`Like`); `displays[i]` draws them as lines or points.
    pub fn plot_dataset(
        &mut self,
        table: &DataTable,
        columns: &[String],
        matches: &[ColumnMatch],
        displays: &[PlotDisplay],
    ) -> Result<PathBuf, PlotError> {
        if columns.is_empty() {
            return Err(PlotError::NoData("dataset plot".to_string()));
        }
        for len in [matches.len(), displays.len()] {
            if len != columns.len() {
                return Err(PlotError::ArgumentMismatch {
                    expected: columns.len(),
                    actual: len,
                });
            }
        }

        let mut panels: Vec<Vec<&Column>> = Vec::with_capacity(columns.len());
        for (name, matching) in columns.iter().zip(matches) {
            let selected = match matching {
                ColumnMatch::Exact => table.column(name).into_iter().collect(),
                ColumnMatch::Like => table.columns_with_prefix(name),
            };
            if selected.is_empty() {
                return Err(PlotError::UnknownColumn(name.clone()));
            }
            panels.push(selected);
        }

        let origin = table.timestamps().first().copied().unwrap_or(0);
        let seconds: Vec<f64> = table
            .timestamps()
            .iter()
            .map(|&t| (t - origin) as f64 / 1e9)
            .collect();
        let x_max = seconds.last().copied().unwrap_or(0.0).max(1e-3);

        let path = self.next_figure_path();
        {
            let root = SVGBackend::new(&path, (self.config.width, self.config.height)).into_drawing_area();
            root.fill(&WHITE).map_err(backend_error)?;
            let areas = root.split_evenly((panels.len(), 1));
            let last_panel = panels.len() - 1;

            for (idx, (area, selected)) in areas.iter().zip(&panels).enumerate() {
                let (lo, hi) = selected
                    .iter()
                    .flat_map(|c| c.non_missing())
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
                let (y_min, y_max) = padded_range(lo, hi);

                let mut chart = ChartBuilder::on(area)
                    .margin(8)
                    .x_label_area_size(if idx == last_panel { 35 } else { 15 })
                    .y_label_area_size(70)
                    .build_cartesian_2d(0.0..x_max, y_min..y_max)
                    .map_err(backend_error)?;

                let y_label = |v: &f64| format_fixed_width_y_label(*v);
                let mut mesh = chart.configure_mesh();
                mesh.y_label_formatter(&y_label).y_labels(5);
                if idx == last_panel {
                    mesh.x_desc("time (s)");
                }
                mesh.draw().map_err(backend_error)?;

                for (j, column) in selected.iter().enumerate() {
                    let color = self.color(j);
                    let points: Vec<(f64, f64)> = seconds
                        .iter()
                        .enumerate()
                        .filter_map(|(row, &x)| column.value(row).map(|y| (x, y)))
                        .collect();

                    let anno = match displays[idx] {
                        PlotDisplay::Line => chart
                            .draw_series(LineSeries::new(points, color.stroke_width(1)))
                            .map_err(backend_error)?,
                        PlotDisplay::Points => {
                            let size = self.config.point_size;
                            chart
                                .draw_series(points.into_iter().map(|p| Circle::new(p, size, color.filled())))
                                .map_err(backend_error)?
                        }
                    };
                    anno.label(column.name.clone())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], color));
                }

                chart
                    .configure_series_labels()
                    .position(SeriesLabelPosition::UpperRight)
                    .background_style(WHITE.mix(0.8))
                    .border_style(BLACK)
                    .draw()
                    .map_err(backend_error)?;
            }

            root.present().map_err(backend_error)?;
        }

        info!("Saved {}-panel dataset plot to {}", panels.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetBuilder;
    use crate::types::{EventAggregation, LabelInterval, NumericAggregation, SensorSample, TimestampUnit};

    const MS: i64 = 1_000_000;

    fn sample_table() -> DataTable {
        let mut b = DatasetBuilder::new(".", 100, TimestampUnit::Nanoseconds).unwrap();
        let xyz: Vec<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        let samples: Vec<_> = (0..20)
            .map(|i| {
                let v = i as f64;
                SensorSample::new(i * 50 * MS, vec![Some(v.sin()), Some(v.cos()), if i % 3 == 0 { None } else { Some(v) }])
            })
            .collect();
        b.add_numerical_samples(Path::new("acc.csv"), &samples, &xyz, NumericAggregation::Avg, "acc_phone_")
            .unwrap();
        b.add_event_intervals(
            Path::new("labels.csv"),
            &[LabelInterval::new(100 * MS, 400 * MS, "walking")],
            EventAggregation::Binary,
            "label",
        )
        .unwrap();
        b.into_table().unwrap()
    }

    fn plot_config() -> PlotConfig {
        PlotConfig {
            width: 400,
            height: 300,
            ..PlotConfig::default()
        }
    }

    #[test]
    fn y_labels_have_fixed_width() {
        assert_eq!(format_fixed_width_y_label(1.5), "  1.50");
        assert_eq!(format_fixed_width_y_label(-12.34), " -12.3");
        assert_eq!(format_fixed_width_y_label(250.0), "   250");
    }

    #[test]
    fn padding_handles_flat_and_empty_ranges() {
        assert_eq!(padded_range(0.0, 10.0), (-1.0, 11.0));
        assert_eq!(padded_range(1.0, 1.0), (0.5, 1.5));
        assert_eq!(padded_range(f64::INFINITY, f64::NEG_INFINITY), (0.0, 1.0));
    }

    #[test]
    fn writes_numbered_svg_figures() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        let mut plotter = DatasetPlotter::new(dir.path().join("figs"), plot_config()).unwrap();

        let boxplot = plotter
            .plot_dataset_boxplot(&table, &["acc_phone_x".to_string(), "acc_phone_y".to_string()])
            .unwrap();
        let panels = plotter
            .plot_dataset(
                &table,
                &["acc_".to_string(), "label".to_string()],
                &[ColumnMatch::Like, ColumnMatch::Like],
                &[PlotDisplay::Line, PlotDisplay::Points],
            )
            .unwrap();

        assert!(boxplot.ends_with("figure_1.svg"));
        assert!(panels.ends_with("figure_2.svg"));
        let svg = std::fs::read_to_string(&panels).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("labelwalking"));
    }

    #[test]
    fn unknown_columns_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        let mut plotter = DatasetPlotter::new(dir.path(), plot_config()).unwrap();

        let err = plotter
            .plot_dataset(&table, &["mag_".to_string()], &[ColumnMatch::Like], &[PlotDisplay::Line])
            .unwrap_err();
        assert!(matches!(err, PlotError::UnknownColumn(ref c) if c == "mag_"));

        let err = plotter
            .plot_dataset(&table, &["acc_phone_x".to_string()], &[ColumnMatch::Exact], &[])
            .unwrap_err();
        assert!(matches!(err, PlotError::ArgumentMismatch { expected: 1, actual: 0 }));
    }
}
