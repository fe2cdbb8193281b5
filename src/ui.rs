use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

use capture_vision::{DetectionKind, UiState};

/// Progress reporting on stderr for the demo's capture and detection steps.
#[derive(Clone, Debug)]
pub struct Progress {
    spinners: bool,
}

impl Progress {
    /// `mode` is auto, plain or pretty. Auto draws spinners on a terminal
    /// unless stdout carries JSON.
    pub fn new(mode: &str, is_tty: bool, json_output: bool) -> Self {
        let spinners = is_tty
            && match mode {
                "pretty" => true,
                "plain" => false,
                _ => !json_output,
            };
        Self { spinners }
    }

    pub fn capture(&self) -> Step {
        self.step("Capture")
    }

    pub fn detection(&self, kind: DetectionKind) -> Step {
        self.step(kind.display_name())
    }

    fn step(&self, label: &str) -> Step {
        let spinner = if self.spinners {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(100));
            let style = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(format!("{label}…"));
            Some(spinner)
        } else {
            eprintln!("==> {}", label);
            None
        };
        Step {
            label: label.to_string(),
            started: Instant::now(),
            spinner,
            closed: false,
        }
    }
}

/// One running step. Dropping it unclosed marks it interrupted.
pub struct Step {
    label: String,
    started: Instant,
    spinner: Option<ProgressBar>,
    closed: bool,
}

impl Step {
    pub fn done(mut self) {
        self.close(true, None);
    }

    /// Close a detection step with what `state` holds for `kind`. Returns
    /// false when the run ended in an error.
    pub fn settle(mut self, kind: DetectionKind, state: &UiState) -> bool {
        match &state.error {
            Some(error) => {
                self.close(false, Some(error.as_str()));
                false
            }
            None => {
                self.close(true, Some(outcome(kind, state).as_str()));
                true
            }
        }
    }

    fn close(&mut self, ok: bool, detail: Option<&str>) {
        self.closed = true;
        let mark = if ok { "✔" } else { "✘" };
        let elapsed = format_duration(self.started.elapsed());
        let line = match detail {
            Some(detail) => format!("{mark} {}: {detail} ({elapsed})", self.label),
            None => format!("{mark} {} ({elapsed})", self.label),
        };
        match &self.spinner {
            Some(spinner) => spinner.finish_with_message(line),
            None => eprintln!("{line}"),
        }
    }
}

impl Drop for Step {
    fn drop(&mut self) {
        if !self.closed {
            self.close(false, Some("interrupted"));
        }
    }
}

/// Summary such as "3 text blocks" or "no barcodes".
fn outcome(kind: DetectionKind, state: &UiState) -> String {
    let (count, one, many) = match kind {
        DetectionKind::Text => (state.text_results.len(), "text block", "text blocks"),
        DetectionKind::Object => (state.object_results.len(), "object", "objects"),
        DetectionKind::Barcode => (state.barcode_results.len(), "barcode", "barcodes"),
        DetectionKind::Face => (state.face_results.len(), "face", "faces"),
        DetectionKind::Label => (state.label_results.len(), "label", "labels"),
    };
    match count {
        0 => format!("no {many}"),
        1 => format!("1 {one}"),
        n => format!("{n} {many}"),
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture_vision::{Barcode, ImageLabel};

    #[test]
    fn spinners_only_on_a_terminal() {
        assert!(Progress::new("auto", true, false).spinners);
        assert!(!Progress::new("auto", true, true).spinners);
        assert!(Progress::new("pretty", true, true).spinners);
        assert!(!Progress::new("pretty", false, false).spinners);
        assert!(!Progress::new("plain", true, false).spinners);
    }

    #[test]
    fn outcome_counts_the_feature_list() {
        let state = UiState {
            barcode_results: vec![Barcode {
                raw_value: "4006381333931".into(),
                format_code: 0x0020,
                bounding_box: None,
            }],
            label_results: vec![
                ImageLabel {
                    label: "Dog".into(),
                    confidence: 0.9,
                },
                ImageLabel {
                    label: "Grass".into(),
                    confidence: 0.6,
                },
            ],
            ..UiState::default()
        };
        assert_eq!(outcome(DetectionKind::Barcode, &state), "1 barcode");
        assert_eq!(outcome(DetectionKind::Label, &state), "2 labels");
        assert_eq!(outcome(DetectionKind::Text, &state), "no text blocks");
    }

    #[test]
    fn settle_reports_errors() {
        let progress = Progress::new("plain", false, false);
        let failed = UiState {
            error: Some("lens covered".into()),
            ..UiState::default()
        };
        assert!(!progress
            .detection(DetectionKind::Face)
            .settle(DetectionKind::Face, &failed));
        assert!(progress
            .detection(DetectionKind::Face)
            .settle(DetectionKind::Face, &UiState::default()));
    }

    #[test]
    fn durations_switch_units_at_one_second() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }
}
