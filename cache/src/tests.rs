/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

#[cfg(test)]
mod tests {
    use crate::symsrv::{FetchOutcome, SymbolCache};

    fn cache_at(dir: &std::path::Path) -> SymbolCache {
        SymbolCache::new(
            dir,
            "https://msdl.microsoft.com/download/symbols",
            "dump_syms",
            5,
            5,
        )
        .unwrap()
    }

    #[test]
    fn test_download_url_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_at(dir.path());
        assert_eq!(
            cache.download_url("ntdll.pdb", "ABCDEF123"),
            "https://msdl.microsoft.com/download/symbols/ntdll.pdb/ABCDEF123/ntdll.pdb"
        );
    }

    #[test]
    fn test_cached_sym_path_layout() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_at(dir.path());
        assert_eq!(
            cache.cached_sym_path("ntdll.pdb", "ABC"),
            dir.path().join("ntdll.pdb/ABC/ntdll.sym")
        );
    }

    #[tokio::test]
    async fn test_present_file_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_at(dir.path());

        let sym_path = cache.cached_sym_path("ntdll.pdb", "ABC");
        tokio::fs::create_dir_all(sym_path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&sym_path, b"MODULE windows x86_64 ABC ntdll.pdb\n")
            .await
            .unwrap();

        // No network or converter involved on a hit.
        let outcome = cache.ensure("ntdll.pdb", "ABC").await.unwrap();
        assert_eq!(outcome, FetchOutcome::AlreadyCached);
    }

    #[tokio::test]
    async fn test_traversal_identity_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_at(dir.path());

        // Rejected before any path join or network call.
        assert!(cache.ensure("..", "ABC").await.is_err());
        assert!(cache.ensure("ntdll.pdb", "../../etc").await.is_err());
        assert!(cache.ensure("ntdll.pdb\\evil", "ABC").await.is_err());
    }
}
