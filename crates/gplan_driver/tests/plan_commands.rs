mod common;

use std::fs;

use common::{compiled, tools, Workspace};
use gplan_driver::{BuildError, Tool};

#[test]
fn excluded_by_tags_means_nothing_to_compile() {
  let mut ws = Workspace::new();
  ws.module("app", "example.com/app");
  ws.go_file("app/main.go", "main", &["example.com/app/feature"]);
  ws.write(
    "app/feature/feature.go",
    "//go:build special\n\npackage feature\n",
  );

  match ws.plan("app") {
    Err(BuildError::NoCompilableSources { import_path }) => assert_eq!(import_path, "example.com/app/feature"),
    other => panic!("expected NoCompilableSources, got {:?}", other.map(|_| ())),
  }

  ws.env.tags = vec!["special".to_string()];
  let planned = ws.plan("app").unwrap();
  assert_eq!(compiled(&planned.plan.commands), vec!["example.com/app/feature", "main"]);
}

#[test]
fn platform_files_follow_the_target() {
  let mut ws = Workspace::new();
  ws.go_file("app/main.go", "main", &[]);
  ws.go_file("app/impl_linux.go", "main", &[]);
  ws.go_file("app/impl_windows.go", "main", &[]);
  ws.go_file("app/main_test.go", "main", &[]);

  let planned = ws.plan("app").unwrap();
  let root = planned.graph.get(planned.graph.root());
  assert_eq!(root.go_files, vec!["impl_linux.go".to_string(), "main.go".to_string()]);

  ws.env.goos = "windows".to_string();
  let planned = ws.plan("app").unwrap();
  let root = planned.graph.get(planned.graph.root());
  assert_eq!(root.go_files, vec!["impl_windows.go".to_string(), "main.go".to_string()]);
}

#[test]
fn precompiled_standard_library_is_bulk_registered() {
  let ws = Workspace::new();
  ws.precompile_std(&["errors", "fmt", "internal/abi"]);
  ws.go_file("goroot/src/fmt/print.go", "fmt", &["errors"]);
  ws.go_file("goroot/src/strings/strings.go", "strings", &[]);
  ws.go_file("app/main.go", "main", &["fmt", "strings", "unsafe"]);

  let planned = ws.plan("app").unwrap();
  let graph = &planned.graph;

  assert!(graph.precompiled_std());
  assert_eq!(graph.len(), 2);
  let fmt = graph.find_by_import_path("fmt").unwrap();
  assert!(graph.get(fmt).internal);
  assert!(graph.get(fmt).go_files.is_empty());
  assert_eq!(
    graph.get(fmt).cached_archive.as_deref(),
    Some(ws.path("goroot/pkg/linux_amd64/fmt.a").as_path())
  );
  assert!(graph.find_by_import_path("strings").is_none());

  assert_eq!(tools(&planned.plan.commands), vec![Tool::Compile, Tool::Link]);

  let cfg = &planned.plan.import_cfg;
  let archives = ws.path("goroot/pkg/linux_amd64");
  assert_eq!(cfg.archive_for("errors"), Some(archives.join("errors.a").as_path()));
  assert_eq!(cfg.archive_for("internal/abi"), Some(archives.join("internal/abi.a").as_path()));
  assert_eq!(cfg.archive_for("fmt"), Some(archives.join("fmt.a").as_path()));
  assert_eq!(cfg.archive_for("main"), Some(planned.layout.archive_for("main").as_path()));

  let written = fs::read_to_string(planned.layout.importcfg()).unwrap();
  assert_eq!(written.lines().count(), 4);
  assert_eq!(written.matches("packagefile fmt=").count(), 1);
}

#[test]
fn standard_library_from_source_without_archives() {
  let ws = Workspace::new();
  ws.go_file("goroot/src/errors/errors.go", "errors", &["internal/reflectlite"]);
  ws.go_file("goroot/src/internal/reflectlite/value.go", "reflectlite", &["unsafe"]);
  ws.go_file("goroot/src/runtime/runtime.go", "runtime", &[]);
  ws.go_file("app/main.go", "main", &["errors", "runtime"]);

  let planned = ws.plan("app").unwrap();
  assert!(!planned.graph.precompiled_std());
  assert_eq!(
    compiled(&planned.plan.commands),
    vec!["internal/reflectlite", "errors", "runtime", "main"]
  );

  let commands = &planned.plan.commands;
  assert!(!commands[0].has_flag("-complete"));
  assert!(!commands[1].has_flag("-std"));
  assert!(commands[2].has_flag("-std") && commands[2].has_flag("-+"));
  assert!(commands[3].has_flag("-complete"));
}

#[test]
fn assembly_package_sequence_and_link() {
  let ws = Workspace::new();
  ws.module("app", "example.com/app");
  ws.go_file("app/main.go", "main", &["example.com/app/simd"]);
  ws.go_file("app/simd/simd.go", "simd", &[]);
  ws.write("app/simd/sum_amd64.s", "#include \"textflag.h\"\n\nTEXT ·Sum(SB),NOSPLIT,$0\n");
  ws.write("app/simd/sum_arm64.s", "TEXT ·Sum(SB),$0\n");

  let planned = ws.plan("app").unwrap();
  let commands = &planned.plan.commands;

  assert_eq!(
    tools(commands),
    vec![Tool::Asm, Tool::Compile, Tool::Asm, Tool::Pack, Tool::Compile, Tool::Link]
  );

  let layout = &planned.layout;
  let object = layout.asm_object_for("example.com/app/simd", "sum_amd64.s");
  let archive = layout.archive_for("example.com/app/simd");
  assert_eq!(
    commands[3].argv(),
    vec![
      "pack".to_string(),
      "r".to_string(),
      archive.display().to_string(),
      object.display().to_string(),
    ]
  );

  let link = commands.last().unwrap();
  assert_eq!(link.flag_value("-o"), Some(layout.executable().to_str().unwrap()));
  assert!(link.has_flag("-buildmode=exe"));
  assert_eq!(
    link.args.last().map(String::as_str),
    Some(layout.archive_for("main").to_str().unwrap())
  );
}

#[test]
fn every_import_path_appears_once_in_importcfg() {
  let ws = Workspace::new();
  ws.module("app", "example.com/app");
  ws.go_file("app/main.go", "main", &["example.com/app/a", "example.com/app/b"]);
  ws.go_file("app/a/a.go", "a", &["example.com/app/b"]);
  ws.go_file("app/b/b.go", "b", &[]);

  let planned = ws.plan("app").unwrap();
  let written = fs::read_to_string(planned.layout.importcfg()).unwrap();

  assert_eq!(
    written.lines().map(|l| l.split('=').next().unwrap()).collect::<Vec<_>>(),
    vec![
      "packagefile example.com/app/b",
      "packagefile example.com/app/a",
      "packagefile main",
    ]
  );
}
