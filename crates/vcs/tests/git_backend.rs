//! Exercises [`Git2Backend`] against real repositories in temporary
//! directories. No network access: clones use local paths.

use std::path::Path;
use std::sync::Arc;

use git2::{Repository, RepositoryInitOptions, Signature};
use pretty_assertions::assert_eq;

use identity::{
    BranchName, Collaborators, FactKind, GitRef, LocalProject, ProjectSpec, RemoteUrl,
    VcsBackend, VcsHandle,
};
use vcs::Git2Backend;

fn init_repo(dir: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    Repository::init_opts(dir, &opts).unwrap()
}

fn commit_file(repo: &Repository, name: &str) -> git2::Oid {
    let workdir = repo.workdir().unwrap().to_path_buf();
    std::fs::write(workdir.join(name), name).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("pkgsync", "pkgsync@example.com").unwrap();
    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parents: Vec<&git2::Commit<'_>> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, name, &tree, &parents)
        .unwrap()
}

fn branch(name: &str) -> BranchName {
    BranchName::new(name).unwrap()
}

fn url(value: &str) -> RemoteUrl {
    RemoteUrl::new(value).unwrap()
}

#[test]
fn test_open_reports_branch_and_remotes_with_origin_first() {
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path());
    commit_file(&repo, "README.md");
    repo.remote("fork", "https://github.com/someone/widget.git")
        .unwrap();
    repo.remote("origin", "git@github.com:acme/widget.git")
        .unwrap();

    let handle = Git2Backend::new().open(dir.path()).unwrap();

    assert_eq!(handle.head().unwrap(), GitRef::Branch(branch("main")));
    assert_eq!(
        handle.remote_urls().unwrap(),
        vec![
            url("git@github.com:acme/widget.git"),
            url("https://github.com/someone/widget.git"),
        ]
    );
    assert_eq!(
        handle.working_dir().unwrap().canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );
}

#[test]
fn test_unborn_branch_is_reported_by_name() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    let handle = Git2Backend::new().open(dir.path()).unwrap();

    assert_eq!(handle.head().unwrap(), GitRef::Branch(branch("main")));
    assert!(handle.branches().unwrap().is_empty());
}

#[test]
fn test_detached_head_is_reported_as_commit() {
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path());
    let oid = commit_file(&repo, "a.txt");
    commit_file(&repo, "b.txt");
    repo.set_head_detached(oid).unwrap();

    let handle = Git2Backend::new().open(dir.path()).unwrap();

    let head = handle.head().unwrap();
    assert!(head.is_detached());
    assert_eq!(head.as_str(), oid.to_string());
}

#[test]
fn test_open_fails_outside_a_repository() {
    let dir = tempfile::tempdir().unwrap();

    let err = Git2Backend::new().open(dir.path()).err().unwrap();

    assert_eq!(err.operation, "open");
}

#[test]
fn test_create_branch_and_checkout() {
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path());
    commit_file(&repo, "README.md");
    let handle = Git2Backend::new().open(dir.path()).unwrap();

    handle.create_branch(&branch("feature"), None).unwrap();
    handle.checkout(&branch("feature")).unwrap();

    assert_eq!(
        handle.branches().unwrap().into_iter().collect::<Vec<_>>(),
        vec![branch("feature"), branch("main")]
    );
    assert_eq!(handle.head().unwrap(), GitRef::Branch(branch("feature")));
    assert!(handle.create_branch(&branch("feature"), None).is_err());
}

#[test]
fn test_checkout_of_missing_branch_fails() {
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path());
    commit_file(&repo, "README.md");
    let handle = Git2Backend::new().open(dir.path()).unwrap();

    let err = handle.checkout(&branch("nope")).unwrap_err();

    assert_eq!(err.operation, "checkout");
    assert_eq!(handle.head().unwrap(), GitRef::Branch(branch("main")));
}

#[test]
fn test_clone_from_local_path() {
    let source = tempfile::tempdir().unwrap();
    let repo = init_repo(source.path());
    commit_file(&repo, "README.md");
    let scratch = tempfile::tempdir().unwrap();
    let backend = Git2Backend::new().with_scratch_parent(scratch.path());
    let source_url = url(source.path().to_str().unwrap());

    let dest = backend.scratch_dir().unwrap();
    assert!(dest.starts_with(scratch.path()));
    let handle = backend.clone_repo(&source_url, &dest).unwrap();

    assert_eq!(handle.head().unwrap(), GitRef::Branch(branch("main")));
    assert_eq!(handle.remote_urls().unwrap(), vec![source_url]);
    assert!(dest.join("README.md").is_file());
}

// ---------------------------------------------------------------------------
// End to end through LocalProject
// ---------------------------------------------------------------------------

#[test]
fn test_local_checkout_resolves_full_identity_offline() {
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path());
    commit_file(&repo, "README.md");
    repo.remote("origin", "https://github.com/acme/widget.git")
        .unwrap();

    let project = LocalProject::new(
        ProjectSpec::new().local_path(dir.path()).offline(true),
        Collaborators::local(Arc::new(Git2Backend::new())),
    )
    .unwrap();

    assert_eq!(project.git_ref(), Some(&GitRef::Branch(branch("main"))));
    assert_eq!(
        project.remote_url(),
        Some(&url("https://github.com/acme/widget.git"))
    );
    assert_eq!(project.namespace().unwrap().as_str(), "acme");
    assert_eq!(project.repo_name().unwrap().as_str(), "widget");
    assert_eq!(project.full_name().unwrap().as_str(), "acme/widget");
    assert!(!project.is_ephemeral());
    assert!(
        project
            .require(&[FactKind::VersionControlHandle, FactKind::Ref])
            .is_ok()
    );
}

#[test]
fn test_requested_branch_is_created_in_real_checkout() {
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path());
    commit_file(&repo, "README.md");

    let project = LocalProject::new(
        ProjectSpec::new()
            .local_path(dir.path())
            .git_ref(branch("release"))
            .offline(true),
        Collaborators::local(Arc::new(Git2Backend::new())),
    )
    .unwrap();

    let head = project.vcs().unwrap().head().unwrap();
    assert_eq!(head, GitRef::Branch(branch("release")));
    assert_eq!(
        repo.head().unwrap().shorthand(),
        Some("release"),
        "checkout is visible to other handles"
    );
}

#[test]
fn test_url_only_project_clones_and_cleans_up() {
    let source = tempfile::tempdir().unwrap();
    let repo = init_repo(source.path());
    commit_file(&repo, "README.md");
    let scratch = tempfile::tempdir().unwrap();
    let backend = Git2Backend::new().with_scratch_parent(scratch.path());

    let mut project = LocalProject::new(
        ProjectSpec::new().remote_url(url(source.path().to_str().unwrap())),
        Collaborators::local(Arc::new(backend)),
    )
    .unwrap();

    assert!(project.is_ephemeral());
    let clone_dir = project.local_path().unwrap().to_path_buf();
    assert!(clone_dir.join("README.md").is_file());
    assert_eq!(project.git_ref(), Some(&GitRef::Branch(branch("main"))));

    assert!(project.cleanup());
    assert!(!clone_dir.exists());
    assert!(!project.cleanup());
}
