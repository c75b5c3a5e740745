//! Pool scenario tests
//!
//! These exercise the index, relation resolution, file provides and the
//! installability classifier together on small hand-built repositories.

use std::collections::HashSet;

use super::*;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Helper to create a pool following the given distribution
fn pool_for(dist_type: DistType) -> Pool {
    init_logger();
    Pool::with_config(PoolConfig::for_dist(dist_type)).unwrap()
}

/// Helper to add a package carrying its `name = evr` self provide
fn pkg(pool: &mut Pool, repo: RepoId, name: &str, evr: &str) -> SolvableId {
    let sid = pool.add_solvable(repo, name, evr, "noarch").unwrap();
    pool.add_self_provides(sid).unwrap();
    sid
}

fn provide(pool: &mut Pool, sid: SolvableId, dep: Id) {
    pool.add_dep(sid, DepKind::Provides, dep, DepMarker::None).unwrap();
}

fn require(pool: &mut Pool, sid: SolvableId, dep: Id) {
    pool.add_dep(sid, DepKind::Requires, dep, DepMarker::None).unwrap();
}

fn set(ids: &[SolvableId]) -> HashSet<SolvableId> {
    ids.iter().copied().collect()
}

#[test]
fn test_every_declared_provide_is_indexed() {
    let mut pool = pool_for(DistType::Deb);
    let repo = pool.add_repo("main");
    let mut declared = Vec::new();
    for (i, name) in ["alpha", "beta", "gamma", "delta"].iter().enumerate() {
        let sid = pkg(&mut pool, repo, name, "1.0");
        let virt = pool.str2id(&format!("virtual-{}", i % 2));
        provide(&mut pool, sid, virt);
        declared.push(sid);
    }
    pool.create_whatprovides().unwrap();

    for &sid in &declared {
        for dep in pool.deps(sid, DepKind::Provides).to_vec() {
            assert!(
                pool.providers_of(dep).unwrap().contains(&sid),
                "{} missing from {}",
                sid,
                pool.dep2str(dep)
            );
        }
    }
}

#[test]
fn test_disabled_and_foreign_arch_excluded() {
    init_logger();
    let mut config = PoolConfig::for_dist(DistType::Deb);
    config.compatible_archs = Some(vec!["x86_64".to_string()]);
    let mut pool = Pool::with_config(config).unwrap();
    let main = pool.add_repo("main");
    let extra = pool.add_repo("extra");
    let native = pool.add_solvable(main, "tool", "1", "x86_64").unwrap();
    let foreign = pool.add_solvable(main, "tool", "1", "s390x").unwrap();
    let disabled = pool.add_solvable(extra, "tool", "2", "x86_64").unwrap();
    for sid in [native, foreign, disabled] {
        pool.add_self_provides(sid).unwrap();
    }
    pool.set_repo_disabled(extra, true).unwrap();
    pool.create_whatprovides().unwrap();

    let tool = pool.str2id("tool");
    assert_eq!(pool.providers_of(tool).unwrap(), vec![native]);

    // installed packages are indexed whatever their arch
    pool.set_installed(Some(main)).unwrap();
    pool.create_whatprovides().unwrap();
    assert_eq!(pool.providers_of(tool).unwrap(), vec![native, foreign]);
}

#[test]
fn test_rebuild_is_idempotent() {
    let mut pool = pool_for(DistType::Deb);
    let repo = pool.add_repo("main");
    let a = pkg(&mut pool, repo, "a", "1");
    let b = pkg(&mut pool, repo, "b", "1");
    let shared = pool.str2id("shared");
    provide(&mut pool, a, shared);
    provide(&mut pool, b, shared);

    pool.create_whatprovides().unwrap();
    let first = pool.providers_of(shared).unwrap();
    let first_generation = pool.index_generation();
    pool.create_whatprovides().unwrap();
    let second = pool.providers_of(shared).unwrap();

    assert_eq!(set(&first), set(&second));
    assert_ne!(first_generation, pool.index_generation());
}

#[test]
fn test_mutation_marks_index_stale() {
    let mut pool = pool_for(DistType::Deb);
    let repo = pool.add_repo("main");
    pkg(&mut pool, repo, "a", "1");
    assert_eq!(pool.index_state(), IndexState::Unbuilt);
    pool.create_whatprovides().unwrap();
    assert_eq!(pool.index_state(), IndexState::Built);

    pkg(&mut pool, repo, "b", "1");
    assert_eq!(pool.index_state(), IndexState::Stale(StaleReason::SolvablesAdded));
    let b = pool.str2id("b");
    assert!(matches!(
        pool.providers_of(b),
        Err(PoolError::IndexStale(StaleReason::SolvablesAdded))
    ));

    pool.create_whatprovides().unwrap();
    pool.set_installed(Some(repo)).unwrap();
    assert_eq!(pool.index_state(), IndexState::Stale(StaleReason::InstalledChanged));
}

#[test]
fn test_version_ranges() {
    let mut pool = pool_for(DistType::Rpm);
    let repo = pool.add_repo("main");
    let old = pkg(&mut pool, repo, "foo", "0.9");
    let mid = pkg(&mut pool, repo, "foo", "1.0");
    let new = pkg(&mut pool, repo, "foo", "2.0");
    pool.create_whatprovides().unwrap();

    let ge = pool.version_dep("foo", VersionFlags::GE, "1.0");
    let lt = pool.version_dep("foo", VersionFlags::LT, "1.0");
    let eq = pool.version_dep("foo", VersionFlags::EQ, "1.0");
    let gt = pool.version_dep("foo", VersionFlags::GT, "2.0");
    let any = pool.version_dep("foo", VersionFlags::all(), "5.0");
    let none = pool.version_dep("foo", VersionFlags::empty(), "1.0");

    assert_eq!(pool.providers_of(ge).unwrap(), vec![mid, new]);
    assert_eq!(pool.providers_of(lt).unwrap(), vec![old]);
    assert_eq!(pool.providers_of(eq).unwrap(), vec![mid]);
    assert!(pool.providers_of(gt).unwrap().is_empty());
    assert_eq!(pool.providers_of(any).unwrap(), vec![old, mid, new]);
    assert!(pool.providers_of(none).unwrap().is_empty());
}

#[test]
fn test_version_ranges_without_provides() {
    let mut pool = pool_for(DistType::Deb);
    let repo = pool.add_repo("main");
    let bare = pool.add_solvable(repo, "bare", "3.0", "all").unwrap();
    let name = pool.str2id("bare");
    pool.create_whatprovides().unwrap();
    assert!(pool.providers_of(name).unwrap().is_empty());

    let list = pool.ids2whatprovides(&[bare]).unwrap();
    assert_eq!(pool.providers(list).unwrap(), &[bare]);
    assert!(pool.match_nevr(bare, name).unwrap());
    let ge = pool.version_dep("bare", VersionFlags::GE, "2.0");
    assert!(pool.match_nevr(bare, ge).unwrap());
}

#[test]
fn test_debian_unversioned_provides() {
    let mut rpm = pool_for(DistType::Rpm);
    let mut deb = pool_for(DistType::Deb);
    for pool in [&mut rpm, &mut deb] {
        let repo = pool.add_repo("main");
        let sid = pkg(pool, repo, "postfix", "3.4");
        let mta = pool.str2id("mail-transport-agent");
        provide(pool, sid, mta);
        pool.create_whatprovides().unwrap();
    }
    let rpm_dep = rpm.version_dep("mail-transport-agent", VersionFlags::GE, "1");
    let deb_dep = deb.version_dep("mail-transport-agent", VersionFlags::GE, "1");
    assert_eq!(rpm.providers_of(rpm_dep).unwrap().len(), 1);
    assert!(deb.providers_of(deb_dep).unwrap().is_empty());
}

#[test]
fn test_rpmlib_falls_back_to_system() {
    let mut pool = pool_for(DistType::Rpm);
    pool.add_repo("main");
    pool.create_whatprovides().unwrap();
    let dep = pool.version_dep("rpmlib(PayloadIsXz)", VersionFlags::LE, "5.2-1");
    assert_eq!(pool.providers_of(dep).unwrap(), vec![SolvableId::SYSTEM]);
    let plain = pool.version_dep("librpm", VersionFlags::LE, "5.2-1");
    assert!(pool.providers_of(plain).unwrap().is_empty());
}

#[test]
fn test_and_or_are_unions() {
    let mut pool = pool_for(DistType::Deb);
    let repo = pool.add_repo("main");
    let a1 = pkg(&mut pool, repo, "a", "1");
    let b1 = pkg(&mut pool, repo, "b", "1");
    let a2 = pkg(&mut pool, repo, "a", "2");
    pool.create_whatprovides().unwrap();

    let a = pool.str2id("a");
    let b = pool.str2id("b");
    let and = pool.rel2id(a, b, RelOp::And);
    let or = pool.rel2id(a, b, RelOp::Or);
    let expected = vec![a1, b1, a2];
    assert_eq!(pool.providers_of(and).unwrap(), expected);
    assert_eq!(pool.providers_of(or).unwrap(), expected);

    let missing = pool.str2id("missing");
    let only_b = pool.rel2id(missing, b, RelOp::Or);
    let list = pool.whatprovides(only_b).unwrap();
    let b_list = pool.whatprovides(b).unwrap();
    // an unchanged operand list is reused
    assert_eq!(list.offset(), b_list.offset());
}

#[test]
fn test_with_cond_and_multiarch() {
    let mut pool = pool_for(DistType::Deb);
    let repo = pool.add_repo("main");
    let both = pkg(&mut pool, repo, "both", "1");
    let one = pkg(&mut pool, repo, "one", "1");
    let x = pool.str2id("x");
    let y = pool.str2id("y");
    provide(&mut pool, both, x);
    provide(&mut pool, both, y);
    provide(&mut pool, one, x);
    pool.create_whatprovides().unwrap();

    let with = pool.rel2id(x, y, RelOp::With);
    assert_eq!(pool.providers_of(with).unwrap(), vec![both]);
    let cond = pool.rel2id(x, y, RelOp::Cond);
    assert_eq!(pool.providers_of(cond).unwrap(), vec![both, one]);

    let any = pool.rel2id(x, known::ARCH_ANY, RelOp::Multiarch);
    assert_eq!(pool.providers_of(any).unwrap(), vec![both, one]);
    let amd64 = pool.str2id("amd64");
    let specific = pool.rel2id(x, amd64, RelOp::Multiarch);
    assert!(pool.providers_of(specific).unwrap().is_empty());
}

#[test]
fn test_with_unsorted_operand() {
    #[derive(Debug)]
    struct Listed(ProviderList);

    impl NamespaceProvider for Listed {
        fn providers(&self, _ids: &IdPool, _name: Id, _evr: Id) -> NamespaceAnswer {
            NamespaceAnswer::List(self.0)
        }
    }

    let mut pool = pool_for(DistType::Rpm);
    let repo = pool.add_repo("main");
    let cap = pool.str2id("cap");
    let mut providers = Vec::new();
    for name in ["a", "b", "c"] {
        let sid = pkg(&mut pool, repo, name, "1");
        provide(&mut pool, sid, cap);
        providers.push(sid);
    }
    pool.create_whatprovides().unwrap();

    let handle = pool.ids2whatprovides(&[providers[2], providers[0]]).unwrap();
    pool.set_namespace_provider(Some(Box::new(Listed(handle))));
    let ns = pool.str2id("namespace:selected");
    let arg = pool.str2id("x");
    let selected = pool.rel2id(ns, arg, RelOp::Namespace);

    let with = pool.rel2id(cap, selected, RelOp::With);
    assert_eq!(pool.providers_of(with).unwrap(), vec![providers[0], providers[2]]);
}

#[test]
fn test_structural_dedup() {
    let mut pool = pool_for(DistType::Deb);
    let repo = pool.add_repo("main");
    let a = pkg(&mut pool, repo, "a", "1");
    let b = pkg(&mut pool, repo, "b", "1");
    let libfoo = pool.str2id("libfoo.so.1");
    let libbar = pool.str2id("libbar.so.1");
    for sid in [a, b] {
        provide(&mut pool, sid, libfoo);
        provide(&mut pool, sid, libbar);
    }
    pool.create_whatprovides().unwrap();

    let foo = pool.whatprovides(libfoo).unwrap();
    let bar = pool.whatprovides(libbar).unwrap();
    assert_eq!(foo.offset(), bar.offset());
    let own = pool.str2id("a");
    assert_ne!(pool.whatprovides(own).unwrap().offset(), foo.offset());
}

#[test]
fn test_namespace_callback() {
    #[derive(Debug)]
    struct Languages;

    impl NamespaceProvider for Languages {
        fn providers(&self, ids: &IdPool, _name: Id, evr: Id) -> NamespaceAnswer {
            match ids.resolve(evr) {
                "de" => NamespaceAnswer::System,
                "fr" => NamespaceAnswer::Solvables(vec![SolvableId(3), SolvableId(2)]),
                _ => NamespaceAnswer::None,
            }
        }
    }

    let mut pool = pool_for(DistType::Rpm);
    let repo = pool.add_repo("main");
    let first = pkg(&mut pool, repo, "lang-fr", "1");
    let second = pkg(&mut pool, repo, "lang-fr-extra", "1");
    pool.create_whatprovides().unwrap();

    let ns = pool.str2id("namespace:language");
    let de = pool.str2id("de");
    let fr = pool.str2id("fr");
    let it = pool.str2id("it");
    let dep_de = pool.rel2id(ns, de, RelOp::Namespace);
    let dep_fr = pool.rel2id(ns, fr, RelOp::Namespace);
    let dep_it = pool.rel2id(ns, it, RelOp::Namespace);

    // without a callback nothing provides a namespace
    assert!(pool.providers_of(dep_de).unwrap().is_empty());

    pool.set_namespace_provider(Some(Box::new(Languages)));
    assert_eq!(pool.providers_of(dep_de).unwrap(), vec![SolvableId::SYSTEM]);
    assert_eq!(pool.providers_of(dep_fr).unwrap(), vec![first, second]);
    assert!(pool.providers_of(dep_it).unwrap().is_empty());

    let lang_fr = pool.str2id("lang-fr");
    let other = pool.rel2id(known::NAMESPACE_OTHERPROVIDERS, lang_fr, RelOp::Namespace);
    assert_eq!(pool.providers_of(other).unwrap(), vec![first]);
}

#[test]
fn test_flush_namespace_providers() {
    #[derive(Debug)]
    struct Fixed(Vec<SolvableId>);

    impl NamespaceProvider for Fixed {
        fn providers(&self, _ids: &IdPool, _name: Id, _evr: Id) -> NamespaceAnswer {
            NamespaceAnswer::Solvables(self.0.clone())
        }
    }

    let mut pool = pool_for(DistType::Rpm);
    let repo = pool.add_repo("main");
    let a = pkg(&mut pool, repo, "a", "1");
    let b = pkg(&mut pool, repo, "b", "1");
    pool.create_whatprovides().unwrap();

    let ns = pool.str2id("namespace:modalias");
    let arg = pool.str2id("pci:v00008086");
    let dep = pool.rel2id(ns, arg, RelOp::Namespace);

    pool.set_namespace_provider(Some(Box::new(Fixed(vec![a]))));
    assert_eq!(pool.providers_of(dep).unwrap(), vec![a]);

    // the cached answer stays until flushed
    pool.namespace_provider = Some(Box::new(Fixed(vec![b])));
    assert_eq!(pool.providers_of(dep).unwrap(), vec![a]);
    let unrelated = pool.str2id("namespace:language");
    pool.flush_namespace_providers(Some(unrelated), None);
    assert_eq!(pool.providers_of(dep).unwrap(), vec![a]);
    pool.flush_namespace_providers(Some(ns), Some(arg));
    assert_eq!(pool.providers_of(dep).unwrap(), vec![b]);
}

#[test]
fn test_arch_relations() {
    let mut pool = pool_for(DistType::Rpm);
    let repo = pool.add_repo("main");
    let bin = pool.add_solvable(repo, "hello", "1-1", "x86_64").unwrap();
    let src = pool.add_solvable(repo, "hello", "1-1", "src").unwrap();
    let nosrc = pool.add_solvable(repo, "hello", "1-1", "nosrc").unwrap();
    let other = pool.add_solvable(repo, "world", "1-1", "x86_64").unwrap();
    for sid in [bin, src, nosrc, other] {
        pool.add_self_provides(sid).unwrap();
    }
    pool.create_whatprovides().unwrap();

    let hello = pool.str2id("hello");
    let x86 = pool.str2id("x86_64");
    let native = pool.rel2id(hello, x86, RelOp::Arch);
    assert_eq!(pool.providers_of(native).unwrap(), vec![bin]);

    // source packages are found although they are not installable
    let sources = pool.rel2id(hello, known::ARCH_SRC, RelOp::Arch);
    assert_eq!(pool.providers_of(sources).unwrap(), vec![src, nosrc]);

    let all_x86 = pool.rel2id(known::EMPTY, x86, RelOp::Arch);
    assert_eq!(pool.providers_of(all_x86).unwrap(), vec![bin, other]);
    let unnamed_x86 = pool.rel2id(Id::NULL, x86, RelOp::Arch);
    assert_eq!(pool.providers_of(unnamed_x86).unwrap(), vec![bin, other]);
}

#[test]
fn test_kind_relation() {
    let mut pool = pool_for(DistType::Rpm);
    let repo = pool.add_repo("main");
    let package = pkg(&mut pool, repo, "cve-fix", "1");
    let patch = pkg(&mut pool, repo, "patch:cve-fix", "1");
    let cap = pool.str2id("cve-fix-capability");
    provide(&mut pool, package, cap);
    provide(&mut pool, patch, cap);
    pool.create_whatprovides().unwrap();

    let patch_kind = pool.str2id("patch");
    let patches = pool.rel2id(cap, patch_kind, RelOp::Kind);
    let packages = pool.rel2id(cap, known::EMPTY, RelOp::Kind);
    assert_eq!(pool.providers_of(patches).unwrap(), vec![patch]);
    assert_eq!(pool.providers_of(packages).unwrap(), vec![package]);
}

#[test]
fn test_kind_relation_without_name() {
    let mut pool = pool_for(DistType::Rpm);
    let repo = pool.add_repo("main");
    let disabled = pool.add_repo("disabled");
    let package = pkg(&mut pool, repo, "foo", "1");
    let patch = pkg(&mut pool, repo, "patch:foo", "1");
    pkg(&mut pool, disabled, "patch:bar", "1");
    pool.set_repo_disabled(disabled, true).unwrap();
    pool.create_whatprovides().unwrap();

    let patch_kind = pool.str2id("patch");
    let patches = pool.rel2id(Id::NULL, patch_kind, RelOp::Kind);
    assert_eq!(pool.providers_of(patches).unwrap(), vec![patch]);
    let packages = pool.rel2id(known::EMPTY, known::EMPTY, RelOp::Kind);
    assert_eq!(pool.providers_of(packages).unwrap(), vec![package]);
}

#[test]
fn test_unknown_relation_is_empty() {
    let mut pool = pool_for(DistType::Rpm);
    let repo = pool.add_repo("main");
    pkg(&mut pool, repo, "a", "1");
    pool.create_whatprovides().unwrap();
    let a = pool.str2id("a");
    let one = pool.str2id("1");
    let odd = pool.rel2id(a, one, RelOp::Unknown(99));
    assert!(pool.providers_of(odd).unwrap().is_empty());
}

#[test]
fn test_whatmatchesdep() {
    let mut pool = pool_for(DistType::Rpm);
    let repo = pool.add_repo("main");
    let old = pkg(&mut pool, repo, "client", "1");
    let new = pkg(&mut pool, repo, "client", "2");
    let lib_old = pool.version_dep("libserver", VersionFlags::GE, "1.0");
    let lib_new = pool.version_dep("libserver", VersionFlags::GE, "3.0");
    require(&mut pool, old, lib_old);
    require(&mut pool, new, lib_new);

    let provided = pool.version_dep("libserver", VersionFlags::EQ, "2.0");
    let matches = pool
        .whatmatchesdep(DepKind::Requires, provided, DepMarker::None)
        .unwrap();
    assert_eq!(matches, vec![old]);
}

#[test]
fn test_file_provides_lazy_fallback() {
    let mut pool = pool_for(DistType::Rpm);
    let repo = pool.add_repo("main");
    let explicit = pkg(&mut pool, repo, "foo-compat", "1");
    let owner = pkg(&mut pool, repo, "foo", "1");
    let user = pkg(&mut pool, repo, "foo-user", "1");
    let path = pool.str2id("/usr/bin/foo");
    provide(&mut pool, explicit, path);
    require(&mut pool, user, path);
    pool.add_file(owner, "/usr/bin/foo").unwrap();

    // lazily resolved through the file lists, merged with the declared provide
    pool.create_whatprovides().unwrap();
    assert_eq!(pool.providers_of(path).unwrap(), vec![explicit, owner]);

    pool.add_file_provides(FileProvidesScope::All).unwrap();
    pool.create_whatprovides().unwrap();
    assert_eq!(pool.providers_of(path).unwrap(), vec![explicit, owner]);
    assert!(pool.deps(owner, DepKind::Provides).contains(&path));
}

#[test]
fn test_file_provides_without_lazy_lookup() {
    // Debian pools do not search file lists lazily
    let mut pool = pool_for(DistType::Deb);
    let repo = pool.add_repo("main");
    let owner = pkg(&mut pool, repo, "foo", "1");
    let user = pkg(&mut pool, repo, "foo-user", "1");
    let path = pool.str2id("/usr/bin/foo");
    require(&mut pool, user, path);
    pool.add_file(owner, "/usr/bin/foo").unwrap();

    pool.create_whatprovides().unwrap();
    assert!(pool.providers_of(path).unwrap().is_empty());

    let report = pool.add_file_provides(FileProvidesScope::All).unwrap();
    assert_eq!(report.created(), 1);
    pool.create_whatprovides().unwrap();
    assert_eq!(pool.providers_of(path).unwrap(), vec![owner]);
}

#[test]
fn test_filtered_file_provides_keep_lazy_lookup() {
    init_logger();
    let mut config = PoolConfig::for_dist(DistType::Rpm);
    config.add_file_provides_filtered = true;
    let mut pool = Pool::with_config(config).unwrap();
    let repo = pool.add_repo("main");
    let owner = pkg(&mut pool, repo, "data", "1");
    let user = pkg(&mut pool, repo, "data-user", "1");
    let data = pool.str2id("/usr/share/data/file");
    require(&mut pool, user, data);
    pool.add_file(owner, "/usr/share/data/file").unwrap();

    let report = pool.add_file_provides(FileProvidesScope::All).unwrap();
    assert_eq!(report.created(), 0);
    pool.create_whatprovides().unwrap();
    // non-standard paths are still looked up on demand
    assert_eq!(pool.providers_of(data).unwrap(), vec![owner]);
}

#[test]
fn test_trivial_installability() {
    let mut pool = pool_for(DistType::Rpm);
    let system = pool.add_repo("@System");
    let repo = pool.add_repo("main");
    pool.set_installed(Some(system)).unwrap();
    let a = pkg(&mut pool, system, "A", "1.0");
    let b = pkg(&mut pool, repo, "B", "1");
    let c = pkg(&mut pool, repo, "C", "1");
    let d = pkg(&mut pool, repo, "D", "1");
    let a_ge1 = pool.version_dep("A", VersionFlags::GE, "1.0");
    let a_ge2 = pool.version_dep("A", VersionFlags::GE, "2.0");
    require(&mut pool, b, a_ge1);
    require(&mut pool, c, a_ge2);
    pool.create_whatprovides().unwrap();

    let result = pool.trivial_installable(&set(&[a]), &[b, c, d], None).unwrap();
    assert_eq!(
        result,
        vec![
            Installability::Installable,
            Installability::NotInstallable,
            Installability::InstallableNonConstraining,
        ]
    );
}

#[test]
fn test_installed_candidate_with_available_conflict() {
    let mut pool = pool_for(DistType::Rpm);
    let system = pool.add_repo("@System");
    let repo = pool.add_repo("main");
    pool.set_installed(Some(system)).unwrap();
    let a = pkg(&mut pool, system, "A", "1.0");
    let x = pkg(&mut pool, repo, "X", "1");
    let z = pool.str2id("Z");
    provide(&mut pool, x, z);
    pool.add_dep(a, DepKind::Conflicts, z, DepMarker::None).unwrap();
    pool.create_whatprovides().unwrap();

    let result = pool.trivial_installable(&set(&[a]), &[a], None).unwrap();
    assert_eq!(result, vec![Installability::InstallableNonConstraining]);

    // once X is installed as well the conflict holds
    let result = pool.trivial_installable(&set(&[a, x]), &[a], None).unwrap();
    assert_eq!(result, vec![Installability::NotInstallable]);
}

#[test]
fn test_file_filter_change_marks_index_stale() {
    #[derive(Debug)]
    struct Nothing;

    impl FileFilter for Nothing {
        fn matches(&self, _path: &str) -> bool {
            false
        }
    }

    let mut pool = pool_for(DistType::Rpm);
    pool.create_whatprovides().unwrap();
    pool.set_file_filter(Box::new(Nothing));
    assert_eq!(pool.index_state(), IndexState::Stale(StaleReason::Explicit));
}

#[test]
fn test_stale_handle_after_rebuild() {
    let mut pool = pool_for(DistType::Deb);
    let repo = pool.add_repo("main");
    let a = pkg(&mut pool, repo, "a", "1");
    pool.create_whatprovides().unwrap();
    let name = pool.str2id("a");
    let handle = pool.whatprovides(name).unwrap();
    assert_eq!(pool.providers(handle).unwrap(), &[a]);

    pkg(&mut pool, repo, "b", "1");
    pool.create_whatprovides().unwrap();
    assert!(matches!(pool.providers(handle), Err(PoolError::StaleHandle { .. })));
}
