/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

#[cfg(test)]
mod tests {
    use crate::breakpad::{
        canonical_sym_path, safe_identifier, symbol_store_path, trim_to_module, SymbolData,
    };
    use crate::input::{check_api_key, greater_than_zero, port_in_range};
    use crate::processor::StackwalkReport;
    use crate::state::StateConfiguration;
    use uuid::uuid;

    #[test]
    fn test_module_line_parsing() {
        let sym = SymbolData::from_module_line(
            "MODULE windows x86_64 3C6AA4C5E7D26FB9B96D01388FDD48A31 app.pdb",
        )
        .unwrap();
        assert_eq!(sym.os, "windows");
        assert_eq!(sym.arch, "x86_64");
        assert_eq!(sym.build_id, "3C6AA4C5E7D26FB9B96D01388FDD48A31");
        assert_eq!(sym.module_id, "app.pdb");

        assert!(SymbolData::from_module_line("FUNC 1000 20 0 main").is_err());
        assert!(SymbolData::from_module_line("MODULE windows x86_64").is_err());
    }

    #[test]
    fn test_trim_to_module() {
        let noisy = b"--boundary\r\nMODULE linux x86_64 ABC app\nFUNC 0 0 0 main\n";
        let trimmed = trim_to_module(noisy).unwrap();
        assert!(trimmed.starts_with(b"MODULE linux"));
        assert!(trim_to_module(b"no records here").is_none());

        let sym = SymbolData::from_sym_contents(trimmed).unwrap();
        assert_eq!(sym.module_id, "app");
    }

    #[test]
    fn test_symbol_paths() {
        assert_eq!(canonical_sym_path("app.pdb", "ABC123"), "app.pdb/ABC123/app.sym");
        assert_eq!(canonical_sym_path("libfoo", "DEF"), "libfoo/DEF/libfoo.sym");

        let project = uuid!("6d2869fb-06cb-42ec-a558-bde85074a08b");
        assert_eq!(
            symbol_store_path(project, "app.pdb", "ABC123"),
            format!("symbol/{}/app.pdb/ABC123/app.sym", project)
        );
    }

    #[test]
    fn test_safe_identifier_rejects_path_escapes() {
        assert!(safe_identifier("app.pdb"));
        assert!(safe_identifier("3C6AA4C5E7D26FB9B96D01388FDD48A31"));
        assert!(safe_identifier("lib-foo_2.so"));

        assert!(!safe_identifier(""));
        assert!(!safe_identifier("."));
        assert!(!safe_identifier(".."));
        assert!(!safe_identifier("../escape"));
        assert!(!safe_identifier("a/b"));
        assert!(!safe_identifier("a\\b"));
        assert!(!safe_identifier("a\0b"));
    }

    #[test]
    fn test_stackwalk_report_parsing() {
        let raw = serde_json::json!({
            "crash_info": {
                "type": "EXCEPTION_ACCESS_VIOLATION_READ",
                "address": "0x0",
                "crashing_thread": 0
            },
            "system_info": {"os": "windows", "cpu_arch": "x86_64", "cpu_count": 8},
            "modules": [
                {"debug_file": "app.pdb", "debug_id": "AAA", "filename": "app.exe"},
                {"debug_file": "ntdll.pdb", "debug_id": "BBB", "missing_symbols": true}
            ],
            "threads": [
                {"frame_count": 1, "frames": [{"frame": 0, "module": "app.exe", "offset": "0x1000", "trust": "context"}]}
            ],
            "crashing_thread": {
                "frames": [{"frame": 0, "registers": {"rip": "0x1000", "rsp": "0x7ffe0000"}}]
            },
            "main_module": 0,
            "pid": 4242,
            "sensitive": {"exploitability": "none"}
        });

        let report: StackwalkReport = serde_json::from_value(raw).unwrap();
        assert_eq!(
            report.main_module_identity(),
            Some(("app.pdb".to_string(), "AAA".to_string()))
        );
        assert_eq!(
            report.modules_missing_symbols(),
            vec![("ntdll.pdb".to_string(), "BBB".to_string())]
        );

        // Unknown top-level fields survive a round trip.
        let back = serde_json::to_value(&report).unwrap();
        assert_eq!(back["sensitive"]["exploitability"], "none");
    }

    #[test]
    fn test_register_merge() {
        let raw = serde_json::json!({
            "crash_info": {"type": "SIGSEGV", "crashing_thread": 1},
            "threads": [
                {"frames": [{"frame": 0}]},
                {"frames": [{"frame": 0, "module": "app"}]}
            ],
            "crashing_thread": {"frames": [{"frame": 0, "registers": {"rip": "0xdead"}}]}
        });

        let mut report: StackwalkReport = serde_json::from_value(raw).unwrap();
        report.merge_crashing_thread_registers();

        let registers = report.threads[1].frames[0].registers.as_ref().unwrap();
        assert_eq!(registers["rip"], "0xdead");
        assert!(report.threads[0].frames[0].registers.is_none());
    }

    #[test]
    fn test_input_validators() {
        assert_eq!(port_in_range("3000"), Ok(3000));
        assert!(port_in_range("0").is_err());
        assert!(port_in_range("notaport").is_err());

        assert_eq!(greater_than_zero::<usize>("10"), Ok(10));
        assert!(greater_than_zero::<usize>("0").is_err());

        assert!(check_api_key(&"a".repeat(32)).is_ok());
        assert!(check_api_key("short").is_err());
        assert!(check_api_key(&"!".repeat(32)).is_err());
    }

    #[test]
    fn test_state_configuration() {
        let config: StateConfiguration = serde_json::from_str(
            r#"{
                "projects": [
                    {
                        "name": "browser",
                        "versioned": true,
                        "minidump_api_key": "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
                        "symbol_api_key": "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"
                    }
                ]
            }"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert!(config.projects[0].versioned);

        let bad = StateConfiguration {
            projects: vec![crate::state::ProjectState {
                name: "x".to_string(),
                versioned: false,
                minidump_api_key: "short".to_string(),
                symbol_api_key: "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_string(),
            }],
        };
        assert!(bad.validate().is_err());
    }
}
