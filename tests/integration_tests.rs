//! End-to-end checks through the public API.

use ttcn_templates::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Everything a checker borrows, built up by each test.
struct Module {
    config: CheckerConfig,
    types: TypeRegistry,
    defs: DefinitionTable,
    arena: TemplateArena,
    diags: Diagnostics,
}

impl Module {
    fn new() -> Self {
        init_tracing();
        Self {
            config: CheckerConfig::default(),
            types: TypeRegistry::with_builtins(),
            defs: DefinitionTable::new(),
            arena: TemplateArena::new(),
            diags: Diagnostics::new(),
        }
    }

    fn checker(&mut self) -> Checker<'_> {
        Checker::new(
            &self.config,
            &self.types,
            &self.defs,
            &mut self.arena,
            &mut self.diags,
        )
    }

    fn node(&mut self, kind: TemplateKind) -> TemplateId {
        self.arena.add(kind, Span::default())
    }

    fn int(&mut self, v: i64) -> TemplateId {
        self.node(TemplateKind::SpecificValue(Value::Integer(v)))
    }

    fn list(&mut self, shape: ListShape, items: Vec<TemplateId>) -> TemplateId {
        self.node(TemplateKind::List { shape, items })
    }

    fn named(&mut self, entries: &[(&str, TemplateId)]) -> TemplateId {
        let entries = entries
            .iter()
            .map(|(name, id)| NamedTemplate::new(*name, *id, Span::default()))
            .collect();
        self.node(TemplateKind::NamedList(entries))
    }

    fn template(&mut self, name: &str, ty: TypeHash, body: TemplateId) -> DefId {
        self.defs.add(Definition::new(
            name,
            Some(ty),
            DefKind::Template {
                body,
                restriction: Restriction::None,
                modifies: None,
                parameterized: false,
            },
            Span::default(),
        ))
    }

    fn check(&mut self, id: TemplateId, ty: TypeHash) -> Checked {
        self.checker()
            .check(id, ty, CheckOptions::top_level(false))
            .unwrap()
    }
}

fn integer() -> TypeHash {
    TypeHash::from_name("integer")
}

fn record(module: &mut Module, name: &str, fields: Vec<Field>) -> TypeHash {
    module
        .types
        .register(TypeDef::new(name, TypeKind::Record { fields }))
}

#[test]
fn scenario_missing_mandatory_field() {
    let mut m = Module::new();
    let rec = record(
        &mut m,
        "R",
        vec![Field::mandatory("a", integer()), Field::mandatory("b", integer())],
    );
    let a = m.int(3);
    let body = m.named(&[("a", a)]);
    let def = m.template("t", rec, body);
    m.checker().check_definition(def).unwrap();
    assert!(m.diags.mentions("Field `b' is missing from template for record type `R'"));
}

#[test]
fn scenario_optional_field_becomes_omit() {
    let mut m = Module::new();
    let rec = record(
        &mut m,
        "R",
        vec![Field::mandatory("a", integer()), Field::optional("b", integer())],
    );
    let a = m.int(3);
    let body = m.named(&[("a", a)]);
    let def = m.template("t", rec, body);
    m.checker().check_definition(def).unwrap();
    assert!(!m.diags.has_errors());

    let TemplateKind::NamedList(entries) = m.arena.kind(body).unwrap() else {
        panic!("expected assignment notation");
    };
    let b = entries.iter().find(|e| e.name == "b").expect("implicit omit for b");
    assert_eq!(m.arena.kind(b.template).unwrap(), &TemplateKind::Omit);
}

#[test]
fn scenario_all_from_constant_list() {
    let mut m = Module::new();
    let ints = m.types.record_of("IntList", integer());
    m.defs.add(Definition::new(
        "x",
        Some(ints),
        DefKind::Const {
            value: Value::int_list(&[10, 20, 30]),
        },
        Span::default(),
    ));
    let one = m.int(1);
    let target = m.node(TemplateKind::SpecificValue(Value::Ref(
        m.defs.reference("x", Span::default()),
    )));
    let slot = m.node(TemplateKind::AllFrom(target));
    let subset = m.list(ListShape::Subset, vec![one, slot]);

    assert!(m.checker().flatten(subset).unwrap());
    let TemplateKind::List { items, .. } = m.arena.kind(subset).unwrap().clone() else {
        panic!("expected a list");
    };
    let values: Vec<i64> = items
        .iter()
        .filter_map(|&item| match m.arena.kind(item).unwrap() {
            TemplateKind::SpecificValue(v) => v.as_integer(),
            _ => None,
        })
        .collect();
    assert_eq!(values, vec![1, 10, 20, 30]);
    assert!(
        !m.arena
            .get(subset)
            .unwrap()
            .flags
            .contains(TemplateFlags::NEEDS_RUNTIME_EXPANSION)
    );
    assert!(m.checker().list_cardinality(subset).unwrap().is_fixed());

    // Refolding changes nothing.
    let before = m.arena.clone();
    assert!(m.checker().flatten(subset).unwrap());
    assert_eq!(m.arena, before);

    // A subset is legal for `set of`, and the spliced elements check cleanly.
    let set = m.types.set_of("IntSet", integer());
    m.check(subset, set);
    assert!(!m.diags.has_errors());
}

#[test]
fn scenario_concatenation_folds_to_pattern() {
    let mut m = Module::new();
    let left = m.node(TemplateKind::SpecificValue(Value::chars("ab")));
    let right = m.node(TemplateKind::CharPattern(CharPattern::literal("c*")));
    let id = m.node(TemplateKind::Concat { left, right });
    m.check(id, TypeHash::from_name("charstring"));
    assert!(!m.diags.has_errors());
    assert_eq!(
        m.arena.kind(id).unwrap(),
        &TemplateKind::CharPattern(CharPattern::literal("abc*"))
    );
}

#[test]
fn scenario_inverted_integer_range() {
    let mut m = Module::new();
    let range = ValueRange::new(
        Some(Value::Integer(10)),
        Some(Value::Integer(5)),
    );
    let id = m.node(TemplateKind::Range(range));
    m.check(id, integer());
    assert!(m.diags.mentions("The lower boundary is higher than the upper boundary"));
}

#[test]
fn checking_twice_changes_nothing() {
    let mut m = Module::new();
    let rec = record(
        &mut m,
        "R",
        vec![Field::mandatory("a", integer()), Field::optional("b", integer())],
    );
    let bad = m.node(TemplateKind::SpecificValue(Value::Boolean(true)));
    let body = m.named(&[("a", bad)]);

    m.check(body, rec);
    let arena = m.arena.clone();
    let diagnostics = m.diags.len();
    m.check(body, rec);
    assert_eq!(m.arena, arena);
    assert_eq!(m.diags.len(), diagnostics);
}

#[test]
fn completeness_does_not_depend_on_field_order() {
    let mut m = Module::new();
    let rec = record(
        &mut m,
        "R3",
        vec![
            Field::mandatory("a", integer()),
            Field::mandatory("b", integer()),
            Field::mandatory("c", integer()),
        ],
    );
    let orders: [[&str; 3]; 3] = [["a", "b", "c"], ["c", "a", "b"], ["b", "c", "a"]];
    for order in orders {
        let entries: Vec<(&str, TemplateId)> =
            order.iter().map(|name| (*name, m.int(1))).collect();
        let id = m.named(&entries);
        m.check(id, rec);
    }
    assert!(m.diags.is_empty(), "{}", m.diags);

    let a = m.int(1);
    let c = m.int(2);
    let id = m.named(&[("c", c), ("a", a)]);
    m.check(id, rec);
    assert_eq!(m.diags.error_count(), 1);
    assert!(m.diags.mentions("Field `b' is missing"));
}

#[test]
fn restriction_lattice_is_sound() {
    let all = [
        Restriction::None,
        Restriction::Omit,
        Restriction::Value,
        Restriction::Present,
    ];
    for x in all {
        assert!(!x.is_less_restrictive(x), "{x} against itself");
        assert!(!x.is_less_restrictive(Restriction::Value), "value satisfies {x}");
    }
    for x in [Restriction::Omit, Restriction::Value, Restriction::Present] {
        assert!(x.is_less_restrictive(Restriction::None));
    }
    assert!(Restriction::Omit.is_less_restrictive(Restriction::Present));
    assert!(Restriction::Present.is_less_restrictive(Restriction::Omit));
}

#[test]
fn array_length_restrictions() {
    let mut m = Module::new();
    let array = m.types.array("Five", integer(), 5);
    let cases: [(LengthRestriction, bool); 4] = [
        (LengthRestriction::single(5), false),
        (LengthRestriction::single(3), true),
        (LengthRestriction::range(6, Some(8)), true),
        (LengthRestriction::range(1, Some(5)), false),
    ];
    for (length, fails) in cases {
        let items = (1..=5).map(|v| m.int(v)).collect();
        let id = m.list(ListShape::Positional, items);
        m.arena.get_mut(id).unwrap().length = Some(length.clone());
        let errors = m.diags.error_count();
        m.check(id, array);
        assert_eq!(m.diags.error_count() > errors, fails, "{length:?}");
    }
    assert!(m.diags.mentions("Length restriction is useless for an array template"));
}

#[test]
fn omit_restriction_on_definition() {
    let mut m = Module::new();
    let any = m.node(TemplateKind::AnyValue);
    m.defs.add(Definition::new(
        "t",
        Some(integer()),
        DefKind::Template {
            body: any,
            restriction: Restriction::Omit,
            modifies: None,
            parameterized: false,
        },
        Span::default(),
    ));
    let Module {
        config,
        types,
        defs,
        arena,
        diags,
    } = &mut m;
    let checked = check_module(config, types, defs, arena, diags).unwrap();
    assert_eq!(checked, 1);
    assert!(diags.mentions("Restriction on template `t' does not allow usage of any value"));
}

#[test]
fn runtime_all_from_leaves_the_slot() {
    let mut m = Module::new();
    let ints = m.types.record_of("IntList", integer());
    m.defs
        .add(Definition::new("v", Some(ints), DefKind::Var, Span::default()));
    let target = m.node(TemplateKind::SpecificValue(Value::Ref(
        m.defs.reference("v", Span::default()),
    )));
    let slot = m.node(TemplateKind::AllFrom(target));
    let two = m.int(2);
    let id = m.list(ListShape::Positional, vec![slot, two]);
    m.check(id, ints);

    assert!(!m.diags.has_errors());
    let node = m.arena.get(id).unwrap();
    assert!(!node.is_flattened());
    assert!(node.flags.contains(TemplateFlags::NEEDS_RUNTIME_EXPANSION));
    let cardinality = m.checker().list_cardinality(id).unwrap();
    assert_eq!(cardinality.fixed, 1);
    assert_eq!(cardinality.runtime_targets, vec![slot]);
}
