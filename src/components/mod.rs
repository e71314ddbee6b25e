pub mod analysis_viewer;
pub mod region_legend;
pub mod report_panel;
