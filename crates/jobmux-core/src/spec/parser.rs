use super::compose::{compose, LaunchMode, LaunchTemplate};
use super::directive::{Directive, Selection};
use super::types::{JobSpec, Window, WindowKind};
use crate::error::{SpecError, SpecErrorKind};

/// Line-by-line interpreter for the job-file language.
///
/// Directives apply strictly in file order, so `param`/`shared` lines only
/// affect the `run`/`vprof` lines after them.
pub struct JobParser<'a> {
    template: &'a LaunchTemplate,
    spec: JobSpec,
}

impl<'a> JobParser<'a> {
    pub fn new(job_name: &str, template: &'a LaunchTemplate) -> Self {
        Self {
            template,
            spec: JobSpec::new(job_name),
        }
    }

    /// Parse the full text of a job file
    pub fn parse(mut self, text: &str) -> Result<JobSpec, SpecError> {
        self.spec.description = description(text);

        for (index, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            Directive::decode(line)
                .and_then(|directive| self.apply(directive))
                .map_err(|kind| SpecError::new(index + 1, raw_line, kind))?;
        }

        tracing::debug!(
            job = %self.spec.job_name,
            windows = self.spec.windows.len(),
            "parsed job file"
        );
        Ok(self.spec)
    }

    fn apply(&mut self, directive: Directive) -> Result<(), SpecErrorKind> {
        match directive {
            Directive::Param {
                name,
                variant,
                fragment,
            } => self.spec.add_param(&name, &variant, &fragment),
            Directive::Shared { fragment } => {
                self.spec.shared_global.push(' ');
                self.spec.shared_global.push_str(&fragment);
                Ok(())
            }
            Directive::SharedLocal { key, fragment } => {
                self.spec.shared_local.insert(key, fragment);
                Ok(())
            }
            Directive::Raw { window, fragment } => self.spec.add_window(Window {
                name: window,
                command: (!fragment.is_empty()).then_some(fragment),
                kind: WindowKind::Raw,
            }),
            Directive::Run(selections) => self.add_composed(&selections, LaunchMode::Run),
            Directive::Vprof(selections) => self.add_composed(&selections, LaunchMode::Vprof),
        }
    }

    fn add_composed(&mut self, selections: &[Selection], mode: LaunchMode) -> Result<(), SpecErrorKind> {
        let composed = compose(&self.spec, selections, mode, self.template)?;
        self.spec.add_window(Window {
            name: composed.run_name,
            command: Some(composed.command),
            kind: mode.into(),
        })
    }
}

/// Description from a `#` comment on the first line
pub fn description(text: &str) -> Option<String> {
    let first = text.lines().next()?.trim();
    let rest = first.strip_prefix('#')?.trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(job: &str, text: &str) -> Result<JobSpec, SpecError> {
        JobParser::new(job, &LaunchTemplate::default()).parse(text)
    }

    #[test]
    fn test_raw_windows_keep_order_and_text() {
        let text = "raw watch   tail -f log.txt\nraw shell\n\nraw gpu watch -n1 nvidia-smi\n";
        let spec = parse("box", text).unwrap();
        let names: Vec<&str> = spec.windows.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["watch", "shell", "gpu"]);
        assert_eq!(spec.windows[0].command.as_deref(), Some("tail -f log.txt"));
        assert_eq!(spec.windows[1].command, None);
        assert_eq!(spec.windows[2].command.as_deref(), Some("watch -n1 nvidia-smi"));
        assert!(spec.windows.iter().all(|w| w.kind == WindowKind::Raw));
        assert_eq!(spec.command_count(), 2);
    }

    #[test]
    fn test_nightly_sweep_scenario() {
        let text = "# nightly sweep\n\
                    param lr low lr=0.01\n\
                    param lr high lr=0.1\n\
                    run lr=low\n\
                    run lr=high\n";
        let spec = parse("nightly", text).unwrap();

        assert_eq!(spec.description.as_deref(), Some("nightly sweep"));
        assert_eq!(spec.windows.len(), 2);
        let low = spec.window("low").unwrap();
        let high = spec.window("high").unwrap();
        let low_cmd = low.command.as_deref().unwrap();
        let high_cmd = high.command.as_deref().unwrap();
        assert!(low_cmd.contains("lr=0.01"));
        assert!(high_cmd.contains("lr=0.1"));
        assert!(!low_cmd.contains("lr=0.1 "));
        for cmd in [low_cmd, high_cmd] {
            assert!(cmd.contains("job_id=nightly___jobid___"));
        }
        assert_eq!(low.kind, WindowKind::Run);
    }

    #[test]
    fn test_duplicate_variant_fails_on_second_line() {
        let err = parse("job", "param p v1 a\nparam p v1 b\n").unwrap_err();
        assert_eq!(err.line_no, 2);
        assert_eq!(err.line, "param p v1 b");
        assert!(matches!(err.kind, SpecErrorKind::DuplicateVariant { .. }));
    }

    #[test]
    fn test_undeclared_param_references_token() {
        let err = parse("job", "param lr low 1\nrun x=y\n").unwrap_err();
        assert_eq!(err.line_no, 2);
        assert_eq!(
            err.kind,
            SpecErrorKind::UnknownParam {
                param: "x".to_string(),
                token: "x=y".to_string(),
            }
        );
        assert!(err.to_string().contains("x=y"));
    }

    #[test]
    fn test_forward_reference_is_rejected() {
        let err = parse("job", "run lr=low\nparam lr low 1\n").unwrap_err();
        assert_eq!(err.line_no, 1);
        assert!(matches!(err.kind, SpecErrorKind::UnknownParam { .. }));
    }

    #[test]
    fn test_fragment_then_local_then_global() {
        // shared lines declared before and after the param on purpose
        let text = "shared x\nparam p v a\nshared(k) y\nrun p=v\n";
        let spec = parse("job", text).unwrap();
        let cmd = spec.window("v").unwrap().command.clone().unwrap();
        let a = cmd.find(" a ").unwrap();
        let y = cmd.find(" y ").unwrap();
        let x = cmd.find(" x ").unwrap();
        assert!(a < y && y < x, "unexpected order in {cmd}");
    }

    #[test]
    fn test_shared_applies_only_to_later_runs() {
        let text = "param p v a\nparam p w b\nrun p=v\nshared --late\nrun p=w\n";
        let spec = parse("job", text).unwrap();
        assert!(!spec.window("v").unwrap().command.as_ref().unwrap().contains("--late"));
        assert!(spec.window("w").unwrap().command.as_ref().unwrap().contains("--late"));
    }

    #[test]
    fn test_shared_local_overwrites_key() {
        let text = "shared(k) one\nshared(k) two\nparam p v a\nrun p=v\n";
        let spec = parse("job", text).unwrap();
        assert_eq!(spec.shared_local.len(), 1);
        let cmd = spec.window("v").unwrap().command.clone().unwrap();
        assert!(cmd.contains(" two"));
        assert!(!cmd.contains(" one"));
    }

    #[test]
    fn test_multi_param_run_name() {
        let text = "param lr low 1\nparam bs big 2\nvprof lr=low bs=big\n";
        let spec = parse("job", text).unwrap();
        let window = spec.window("low.big").unwrap();
        assert_eq!(window.kind, WindowKind::Vprof);
    }

    #[test]
    fn test_duplicate_window_and_job_prefix() {
        let err = parse("job", "raw w ls\nraw w pwd\n").unwrap_err();
        assert_eq!(err.kind, SpecErrorKind::DuplicateWindow("w".to_string()));

        let err = parse("sweep", "raw sweep_watch ls\n").unwrap_err();
        assert_eq!(err.line_no, 1);
        assert!(matches!(err.kind, SpecErrorKind::WindowShadowsJob { .. }));

        // a run name colliding with a raw window is also a duplicate
        let err = parse("job", "raw low ls\nparam lr low 1\nrun lr=low\n").unwrap_err();
        assert_eq!(err.line_no, 3);
    }

    #[test]
    fn test_unknown_directive() {
        let err = parse("job", "# header\n\ntrain lr=low\n").unwrap_err();
        assert_eq!(err.line_no, 3);
        assert_eq!(
            err.kind,
            SpecErrorKind::UnknownDirective("train".to_string())
        );
    }

    #[test]
    fn test_comments_and_indentation_ignored() {
        let text = "  # indented comment\n\traw   a   echo hi  \n#raw b echo no\n";
        let spec = parse("job", text).unwrap();
        assert_eq!(spec.windows.len(), 1);
        assert_eq!(spec.windows[0].command.as_deref(), Some("echo hi"));
        // first line is a comment, so it is also the description
        assert_eq!(spec.description.as_deref(), Some("indented comment"));
    }

    #[test]
    fn test_description_only_from_first_line() {
        assert_eq!(description("raw a ls\n# later\n"), None);
        assert_eq!(description("#\n"), None);
        assert_eq!(description(""), None);
        assert_eq!(description("#  lr sweep  \n"), Some("lr sweep".to_string()));
    }
}
