//! Items and the reconciliation state machine
//!
//! An [`Item`] pairs an identity and validated attributes with an
//! [`ItemKind`], the variant-specific part that knows how to inspect, describe
//! and fix one type of resource. [`Item::apply`] is the same for every kind:
//!
//! 1. Query status. Correct items are left alone.
//! 2. Run the `unless` guard if there is one; success skips the item.
//! 3. Ask for confirmation when interactive; a decline skips the item.
//! 4. Fix, then query status again to confirm convergence.
//!
//! [`Reconcile`] erases the kind so that a bundle can hold items of every type.

use crate::attributes::{Attributes, ItemDescriptor, Value};
use crate::context::ApplyMode;
use crate::error::{Error, Result};
use crate::node::Node;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identity of an item: unique by `(item_type, name)` within its bundle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId {
    pub bundle: String,
    pub item_type: String,
    pub name: String,
}

impl ItemId {
    pub fn new(bundle: &str, item_type: &str, name: &str) -> Self {
        Self {
            bundle: bundle.to_string(),
            item_type: item_type.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.item_type, self.name)
    }
}

/// Freshly queried state of an item
///
/// `info` is private to the item kind that produced it: it records which
/// facets differ and whatever was learned from the node while finding out.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemStatus<I> {
    pub correct: bool,
    /// The kind declined to evaluate this item right now
    pub skipped: bool,
    /// Whether `fix` can converge the item
    pub fixable: bool,
    pub info: I,
}

impl<I> ItemStatus<I> {
    pub fn new(correct: bool, info: I) -> Self {
        Self {
            correct,
            skipped: false,
            fixable: true,
            info,
        }
    }

    pub fn skipped(info: I) -> Self {
        Self {
            correct: false,
            skipped: true,
            fixable: true,
            info,
        }
    }

    pub fn with_fixable(mut self, fixable: bool) -> Self {
        self.fixable = fixable;
        self
    }
}

/// Outcome of [`Item::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyOutcome {
    /// Already correct, nothing done
    Ok,
    /// Fixed and verified
    Fixed,
    /// Guarded by `unless`, declined, or skipped by the kind
    Skipped,
    /// Fixed but still incorrect, or not fixable
    Failed,
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::Fixed => "fixed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Variant-specific behavior of an item type
///
/// `get_status` and `ask` must not change anything on the node. `fix` is
/// only called with a status that is not correct.
pub trait ItemKind: Send + Sync + fmt::Debug + Sized {
    /// Detail recorded by `get_status` for `ask` and `fix`
    type Info: fmt::Debug + Clone + PartialEq + Send;

    /// Attribute declaration of this item type
    fn descriptor(&self) -> &ItemDescriptor;

    /// Inspect the node and compare against the item's attributes
    fn get_status(&self, item: &Item<Self>) -> Result<ItemStatus<Self::Info>>;

    /// Describe the pending change, one line per facet
    fn ask(&self, item: &Item<Self>, status: &ItemStatus<Self::Info>) -> String;

    /// Converge every facet flagged in `status`
    fn fix(&self, item: &Item<Self>, status: &ItemStatus<Self::Info>) -> Result<()>;
}

/// A single managed resource on a node
#[derive(Debug)]
pub struct Item<K: ItemKind> {
    id: ItemId,
    attributes: Attributes,
    depends: Vec<String>,
    unless: Option<String>,
    node: Arc<dyn Node>,
    kind: K,
}

impl<K: ItemKind> Item<K> {
    /// Create an item from user-declared attributes
    ///
    /// Fails with a configuration error if an attribute name is unknown, a
    /// required attribute is missing, or a value is rejected.
    pub fn new(
        bundle: &str,
        node: Arc<dyn Node>,
        kind: K,
        name: &str,
        attributes: Attributes,
    ) -> Result<Self> {
        let id = ItemId::new(bundle, kind.descriptor().type_name(), name);
        kind.descriptor().validate(&id, &attributes)?;
        Ok(Self::assemble(id, node, kind, &attributes))
    }

    /// Create an item without validating its attributes
    ///
    /// For items built by code rather than declared by users.
    pub fn without_validation(
        bundle: &str,
        node: Arc<dyn Node>,
        kind: K,
        name: &str,
        attributes: Attributes,
    ) -> Self {
        let id = ItemId::new(bundle, kind.descriptor().type_name(), name);
        Self::assemble(id, node, kind, &attributes)
    }

    fn assemble(id: ItemId, node: Arc<dyn Node>, kind: K, supplied: &Attributes) -> Self {
        let unless = supplied
            .get("unless")
            .and_then(Value::as_str)
            .map(str::to_string);
        let depends = supplied
            .get("depends")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let attributes = kind.descriptor().merge(supplied);

        Self {
            id,
            attributes,
            depends,
            unless,
            node,
            kind,
        }
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    /// Name of the item (for most kinds, a path on the node)
    pub fn name(&self) -> &str {
        &self.id.name
    }

    /// Declared defaults overlaid with supplied values
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// String attribute, or `None` if unset or not a string
    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(Value::as_str)
    }

    pub fn node(&self) -> &dyn Node {
        self.node.as_ref()
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Guard command; when it succeeds the item is not fixed
    pub fn unless(&self) -> Option<&str> {
        self.unless.as_deref()
    }

    /// Static dependencies of the type followed by declared ones
    pub fn depends(&self) -> Vec<String> {
        self.kind
            .descriptor()
            .static_dependencies()
            .iter()
            .chain(self.depends.iter())
            .cloned()
            .collect()
    }

    pub fn get_status(&self) -> Result<ItemStatus<K::Info>> {
        self.kind.get_status(self)
    }

    pub fn ask(&self, status: &ItemStatus<K::Info>) -> String {
        self.kind.ask(self, status)
    }

    pub fn fix(&self, status: &ItemStatus<K::Info>) -> Result<()> {
        self.kind.fix(self, status)
    }

    /// Bring the item to its declared state
    ///
    /// Errors from the node, including a failed mutating command, are
    /// returned as `Err`; the item is never reported fixed in that case.
    pub fn apply(&self, mode: ApplyMode<'_>) -> Result<ApplyOutcome> {
        let node = self.node.name();
        let status = self.get_status()?;

        if status.correct {
            log::debug!("{}:{}: correct", node, self.id);
            return Ok(ApplyOutcome::Ok);
        }

        if let Some(unless) = self.unless() {
            let result = self.node.run(unless)?;
            if result.success() {
                log::debug!(
                    "{}:{}: not fixing, 'unless' succeeded: {}",
                    node,
                    self.id,
                    unless
                );
                return Ok(ApplyOutcome::Skipped);
            }
        }

        if status.skipped {
            log::debug!("{}:{}: skipped", node, self.id);
            return Ok(ApplyOutcome::Skipped);
        }

        if !status.fixable {
            log::warn!("{}:{}: incorrect and cannot be fixed", node, self.id);
            return Ok(ApplyOutcome::Failed);
        }

        if let ApplyMode::Interactive(confirm) = mode {
            let question = self.question(&status);
            if !confirm.confirm(&question)? {
                log::debug!("{}:{}: fix declined", node, self.id);
                return Ok(ApplyOutcome::Skipped);
            }
        }

        log::info!("{}:{}: fixing...", node, self.id);
        self.fix(&status)?;

        let status_after = self.get_status()?;
        if status_after.correct {
            Ok(ApplyOutcome::Fixed)
        } else {
            log::error!(
                "{}:{}: still incorrect after fixing:\n{}",
                node,
                self.id,
                self.ask(&status_after)
            );
            Ok(ApplyOutcome::Failed)
        }
    }

    /// Prompt shown before an interactive fix
    fn question(&self, status: &ItemStatus<K::Info>) -> String {
        let mut question = format!("{}: {}\n", self.node.name(), self.id);
        for line in self.ask(status).lines() {
            question.push_str("  ");
            question.push_str(line);
            question.push('\n');
        }
        question.push_str(&format!("Fix {}?", self.id));
        question
    }
}

/// Result of checking an item without fixing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub correct: bool,
    pub skipped: bool,
    /// Rendered pending change, present when the item is incorrect
    pub diff: Option<String>,
}

/// An item of any kind
pub trait Reconcile: Send + Sync + fmt::Debug {
    fn id(&self) -> &ItemId;

    /// Dependency selectors (static ones first)
    fn depends(&self) -> Vec<String>;

    /// See [`Item::apply`]
    fn apply(&self, mode: ApplyMode<'_>) -> Result<ApplyOutcome>;

    /// Query status and describe what `apply` would change
    fn verify(&self) -> Result<Verification>;
}

impl<K: ItemKind> Reconcile for Item<K> {
    fn id(&self) -> &ItemId {
        &self.id
    }

    fn depends(&self) -> Vec<String> {
        Item::depends(self)
    }

    fn apply(&self, mode: ApplyMode<'_>) -> Result<ApplyOutcome> {
        Item::apply(self, mode)
    }

    fn verify(&self) -> Result<Verification> {
        let status = self.get_status()?;
        let mut skipped = status.skipped;
        if !status.correct
            && !skipped
            && let Some(unless) = self.unless()
        {
            skipped = self.node.run(unless)?.success();
        }
        let diff = (!status.correct && !skipped).then(|| self.ask(&status));
        Ok(Verification {
            correct: status.correct,
            skipped,
            diff,
        })
    }
}

/// A boxed item for type-erased storage
pub type BoxedItem = Box<dyn Reconcile>;

/// Fail if two items of one bundle share a type and name
pub fn check_bundle_collisions(items: &[BoxedItem]) -> Result<()> {
    let mut seen: HashMap<(&str, &str), &ItemId> = HashMap::new();
    for item in items {
        let id = item.id();
        if let Some(first) = seen.insert((id.item_type.as_str(), id.name.as_str()), id) {
            return Err(Error::DuplicateItem {
                first: first.clone(),
                second: id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AutoConfirm, AutoDecline, ConfirmCallback};
    use crate::testing::FakeHost;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Item kind with canned statuses that counts calls
    #[derive(Debug)]
    struct MockKind {
        descriptor: ItemDescriptor,
        before: ItemStatus<()>,
        after: ItemStatus<()>,
        status_calls: AtomicUsize,
        ask_calls: AtomicUsize,
        fix_calls: AtomicUsize,
        fail_fix: bool,
    }

    impl MockKind {
        fn new(correct_before: bool) -> Self {
            Self {
                descriptor: ItemDescriptor::new("type1", "mock"),
                before: ItemStatus::new(correct_before, ()),
                after: ItemStatus::new(true, ()),
                status_calls: AtomicUsize::new(0),
                ask_calls: AtomicUsize::new(0),
                fix_calls: AtomicUsize::new(0),
                fail_fix: false,
            }
        }

        fn after(mut self, status: ItemStatus<()>) -> Self {
            self.after = status;
            self
        }

        fn before(mut self, status: ItemStatus<()>) -> Self {
            self.before = status;
            self
        }
    }

    impl ItemKind for MockKind {
        type Info = ();

        fn descriptor(&self) -> &ItemDescriptor {
            &self.descriptor
        }

        fn get_status(&self, _item: &Item<Self>) -> Result<ItemStatus<()>> {
            let calls = self.status_calls.fetch_add(1, Ordering::SeqCst);
            if calls == 0 || self.fix_calls.load(Ordering::SeqCst) == 0 {
                Ok(self.before.clone())
            } else {
                Ok(self.after.clone())
            }
        }

        fn ask(&self, _item: &Item<Self>, _status: &ItemStatus<()>) -> String {
            self.ask_calls.fetch_add(1, Ordering::SeqCst);
            "?".to_string()
        }

        fn fix(&self, item: &Item<Self>, _status: &ItemStatus<()>) -> Result<()> {
            self.fix_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_fix {
                item.node().run_checked("false")?;
            }
            Ok(())
        }
    }

    /// Records prompts and answers with a fixed reply
    struct Recorder {
        answer: bool,
        prompts: Vec<String>,
    }

    impl ConfirmCallback for Recorder {
        fn confirm(&mut self, prompt: &str) -> Result<bool> {
            self.prompts.push(prompt.to_string());
            Ok(self.answer)
        }
    }

    fn attrs(value: serde_json::Value) -> Attributes {
        serde_json::from_value(value).unwrap()
    }

    fn mock_item(kind: MockKind, attributes: Attributes) -> (Item<MockKind>, Arc<FakeHost>) {
        let host = Arc::new(FakeHost::new());
        let item = Item::without_validation("bundle1", host.clone(), kind, "item1", attributes);
        (item, host)
    }

    #[test]
    fn test_noninteractive() {
        let (item, _) = mock_item(MockKind::new(false), Attributes::new());
        let outcome = item.apply(ApplyMode::Unattended).unwrap();
        assert_eq!(outcome, ApplyOutcome::Fixed);
        assert_eq!(item.kind().fix_calls.load(Ordering::SeqCst), 1);
        assert_eq!(item.kind().status_calls.load(Ordering::SeqCst), 2);
        assert_eq!(item.kind().ask_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_interactive() {
        let (item, _) = mock_item(MockKind::new(false), Attributes::new());
        let mut recorder = Recorder {
            answer: true,
            prompts: Vec::new(),
        };
        let outcome = item.apply(ApplyMode::Interactive(&mut recorder)).unwrap();
        assert_eq!(outcome, ApplyOutcome::Fixed);
        assert_eq!(item.kind().fix_calls.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.prompts.len(), 1);
        assert_eq!(
            recorder.prompts[0],
            "fakehost: type1:item1\n  ?\nFix type1:item1?"
        );
    }

    #[test]
    fn test_interactive_abort() {
        let (item, host) = mock_item(MockKind::new(false), Attributes::new());
        let outcome = item.apply(ApplyMode::Interactive(&mut AutoDecline)).unwrap();
        assert_eq!(outcome, ApplyOutcome::Skipped);
        assert_eq!(item.kind().fix_calls.load(Ordering::SeqCst), 0);
        assert_eq!(item.kind().ask_calls.load(Ordering::SeqCst), 1);
        assert_eq!(item.kind().status_calls.load(Ordering::SeqCst), 1);
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_correct() {
        let (item, _) = mock_item(MockKind::new(true), Attributes::new());
        let outcome = item.apply(ApplyMode::Interactive(&mut AutoConfirm)).unwrap();
        assert_eq!(outcome, ApplyOutcome::Ok);
        assert_eq!(item.kind().fix_calls.load(Ordering::SeqCst), 0);
        assert_eq!(item.kind().ask_calls.load(Ordering::SeqCst), 0);
        assert_eq!(item.kind().status_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_correct_does_not_run_unless() {
        let (item, host) = mock_item(MockKind::new(true), attrs(json!({"unless": "true"})));
        assert_eq!(item.apply(ApplyMode::Unattended).unwrap(), ApplyOutcome::Ok);
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_unless() {
        let (item, host) = mock_item(MockKind::new(false), attrs(json!({"unless": "true"})));
        let outcome = item.apply(ApplyMode::Unattended).unwrap();
        assert_eq!(outcome, ApplyOutcome::Skipped);
        assert_eq!(item.kind().fix_calls.load(Ordering::SeqCst), 0);
        assert_eq!(item.kind().ask_calls.load(Ordering::SeqCst), 0);
        assert_eq!(host.commands(), vec!["true".to_string()]);
    }

    #[test]
    fn test_unless_skips_before_asking() {
        let (item, _) = mock_item(MockKind::new(false), attrs(json!({"unless": "true"})));
        let mut recorder = Recorder {
            answer: true,
            prompts: Vec::new(),
        };
        let outcome = item.apply(ApplyMode::Interactive(&mut recorder)).unwrap();
        assert_eq!(outcome, ApplyOutcome::Skipped);
        assert!(recorder.prompts.is_empty());
    }

    #[test]
    fn test_unless_fails() {
        let (item, host) = mock_item(MockKind::new(false), attrs(json!({"unless": "false"})));
        let outcome = item.apply(ApplyMode::Unattended).unwrap();
        assert_eq!(outcome, ApplyOutcome::Fixed);
        assert_eq!(item.kind().fix_calls.load(Ordering::SeqCst), 1);
        assert_eq!(host.commands(), vec!["false".to_string()]);
    }

    #[test]
    fn test_still_incorrect_after_fix_fails() {
        let kind = MockKind::new(false).after(ItemStatus::new(false, ()));
        let (item, _) = mock_item(kind, Attributes::new());
        let outcome = item.apply(ApplyMode::Unattended).unwrap();
        assert_eq!(outcome, ApplyOutcome::Failed);
        assert_eq!(item.kind().fix_calls.load(Ordering::SeqCst), 1);
        assert_eq!(item.kind().status_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_command_propagates() {
        let mut kind = MockKind::new(false);
        kind.fail_fix = true;
        let (item, _) = mock_item(kind, Attributes::new());
        let err = item.apply(ApplyMode::Unattended).unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
        assert_eq!(item.kind().status_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_skipped_status() {
        let kind = MockKind::new(false).before(ItemStatus::skipped(()));
        let (item, _) = mock_item(kind, Attributes::new());
        assert_eq!(item.apply(ApplyMode::Unattended).unwrap(), ApplyOutcome::Skipped);
        assert_eq!(item.kind().fix_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unfixable_status() {
        let kind = MockKind::new(false).before(ItemStatus::new(false, ()).with_fixable(false));
        let (item, _) = mock_item(kind, Attributes::new());
        let outcome = item.apply(ApplyMode::Interactive(&mut AutoConfirm)).unwrap();
        assert_eq!(outcome, ApplyOutcome::Failed);
        assert_eq!(item.kind().fix_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_init_no_validation() {
        let kind = MockKind::new(true);
        let host: Arc<dyn Node> = Arc::new(FakeHost::new());
        let item = Item::without_validation(
            "bundle1",
            host,
            kind,
            "item1",
            attrs(json!({"bogus": 1})),
        );
        assert_eq!(item.id(), &ItemId::new("bundle1", "type1", "item1"));
        assert_eq!(item.name(), "item1");
        assert_eq!(item.attribute("bogus"), Some(&json!(1)));
    }

    #[test]
    fn test_init_with_validation() {
        let host: Arc<dyn Node> = Arc::new(FakeHost::new());
        let err = Item::new(
            "bundle1",
            host,
            MockKind::new(true),
            "item1",
            attrs(json!({"bogus": 1})),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidAttributeName { ref name, .. } if name == "bogus"));
    }

    #[test]
    fn test_subclass_attributes() {
        let mut kind = MockKind::new(true);
        kind.descriptor = ItemDescriptor::new("type1", "mock")
            .attribute("foo", 47)
            .attribute("bar", 48);
        let host: Arc<dyn Node> = Arc::new(FakeHost::new());
        let item = Item::new("bundle1", host, kind, "item1", attrs(json!({"foo": 49}))).unwrap();
        assert_eq!(item.attributes(), &attrs(json!({"foo": 49, "bar": 48})));
    }

    #[test]
    fn test_depends() {
        let mut kind = MockKind::new(true);
        kind.descriptor = ItemDescriptor::new("type1", "mock").depends_static("directory:");
        let (item, _) = mock_item(
            kind,
            attrs(json!({"depends": ["file:/etc/motd"], "unless": "true"})),
        );
        assert_eq!(
            item.depends(),
            vec!["directory:".to_string(), "file:/etc/motd".to_string()]
        );
        assert_eq!(item.unless(), Some("true"));
        assert!(item.attribute("depends").is_none());
    }

    #[test]
    fn test_verify() {
        let (item, _) = mock_item(MockKind::new(false), Attributes::new());
        let verification = Reconcile::verify(&item).unwrap();
        assert!(!verification.correct);
        assert_eq!(verification.diff.as_deref(), Some("?"));
        assert_eq!(item.kind().fix_calls.load(Ordering::SeqCst), 0);

        let (item, _) = mock_item(MockKind::new(true), Attributes::new());
        let verification = Reconcile::verify(&item).unwrap();
        assert!(verification.correct);
        assert!(verification.diff.is_none());
    }

    #[test]
    fn test_verify_honors_unless() {
        let (item, host) = mock_item(MockKind::new(false), attrs(json!({"unless": "true"})));
        let verification = Reconcile::verify(&item).unwrap();
        assert!(!verification.correct);
        assert!(verification.skipped);
        assert!(verification.diff.is_none());
        assert_eq!(item.kind().ask_calls.load(Ordering::SeqCst), 0);
        assert_eq!(host.commands(), vec!["true".to_string()]);

        let (item, _) = mock_item(MockKind::new(false), attrs(json!({"unless": "false"})));
        let verification = Reconcile::verify(&item).unwrap();
        assert!(!verification.skipped);
        assert_eq!(verification.diff.as_deref(), Some("?"));
    }

    #[test]
    fn test_verify_correct_does_not_run_unless() {
        let (item, host) = mock_item(MockKind::new(true), attrs(json!({"unless": "true"})));
        assert!(Reconcile::verify(&item).unwrap().correct);
        assert!(host.commands().is_empty());
    }

    fn boxed(name: &str) -> BoxedItem {
        let host: Arc<dyn Node> = Arc::new(FakeHost::new());
        Box::new(Item::without_validation(
            "bundle1",
            host,
            MockKind::new(true),
            name,
            Attributes::new(),
        ))
    }

    #[test]
    fn test_collision() {
        let items = vec![boxed("item1"), boxed("item2"), boxed("item1")];
        let err = check_bundle_collisions(&items).unwrap_err();
        match err {
            Error::DuplicateItem { first, second } => {
                assert_eq!(first.name, "item1");
                assert_eq!(second.name, "item1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_collision() {
        let items = vec![boxed("item1"), boxed("item2")];
        check_bundle_collisions(&items).unwrap();
    }

    #[test]
    fn test_outcome_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ApplyOutcome::Fixed).unwrap(),
            "\"fixed\""
        );
        assert_eq!(ApplyOutcome::Skipped.to_string(), "skipped");
    }
}
