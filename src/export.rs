// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Writes the documents of an export session.

mod equipment;
mod state_variables;
mod steady_state;
mod topology;

use crate::{
    AliasType, DanglingLine, DocumentSink, DocumentWriter, Error, ExportConfig, ExportContext,
    IdMapping, Identifiable, NamingStrategy, Network, PhaseRegulationMode, PhaseTapChanger,
    Profile, RatioTapChanger, SharedObject, TapChanger, TerminalRef,
};

/// The property holding the identifier of the generating unit of a
/// generator.
const GENERATING_UNIT: &str = "GeneratingUnit";
/// The property holding the identifier of the regulating control of an
/// injection.
const REGULATING_CONTROL: &str = "RegulatingControl";
/// The property holding the identifier of the reactive capability curve of a
/// generator.
const REACTIVE_CAPABILITY_CURVE: &str = "ReactiveCapabilityCurve";

/// Exports a network to the writers of the given sink, with the naming
/// strategy selected in the config, and returns the identifiers handed out
/// during the export.
///
/// The requested profiles are written one after the other, in the order of
/// [`Profile::ALL`].
pub fn export_network(
    network: &Network,
    config: &ExportConfig,
    sink: &mut dyn DocumentSink,
) -> Result<IdMapping, Error> {
    let naming = NamingStrategy::from_config(config, network, None)?;
    export_network_with(naming, network, config, sink)
}

/// Exports a network with the given naming strategy.
///
/// This is how a fixed naming strategy, seeded with the id mapping of a
/// previous export, is used.
pub fn export_network_with(
    naming: NamingStrategy,
    network: &Network,
    config: &ExportConfig,
    sink: &mut dyn DocumentSink,
) -> Result<IdMapping, Error> {
    check_profiles(network, config);

    let mut context = ExportContext::new(network, config.clone(), naming)?;
    for profile in Profile::ALL.into_iter().filter(|p| config.exports(*p)) {
        let writer = sink.writer(profile)?;
        Emitter {
            ctx: &mut context,
            writer,
            profile,
        }
        .write_document()?;
    }
    Ok(context.into_naming().into_id_mapping())
}

/// Companion documents of node/breaker networks refer to topological nodes,
/// which are only defined in the topology document.
fn check_profiles(network: &Network, config: &ExportConfig) {
    if !network.has_node_breaker_topology() || config.exports(Profile::Topology) {
        return;
    }
    for profile in [Profile::SteadyStateHypothesis, Profile::StateVariables] {
        if config.exports(profile) {
            tracing::error!(
                "Network {} has node/breaker voltage levels and {profile} is exported without TP: \
                 references to topological nodes will not resolve.",
                network.id
            );
        }
    }
}

/// Returns true if the injection has a regulating control of its own.
fn has_regulating_control(equipment: &dyn Identifiable, regulating: bool) -> bool {
    regulating || equipment.property(REGULATING_CONTROL).is_some()
}

/// The two kinds of tap changers.
#[derive(Clone, Copy, Debug)]
enum TapChangerKind<'t> {
    Ratio(&'t RatioTapChanger),
    Phase(&'t PhaseTapChanger),
}

impl<'t> TapChangerKind<'t> {
    fn tap_changer(&self) -> &'t dyn TapChanger {
        match self {
            TapChangerKind::Ratio(t) => *t,
            TapChangerKind::Phase(t) => *t,
        }
    }

    fn regulating(&self) -> bool {
        match self {
            TapChangerKind::Ratio(t) => t.regulating,
            TapChangerKind::Phase(t) => t.regulating,
        }
    }
}

/// A tap changer, with the transformer and the end it is attached to.
#[derive(Clone, Copy)]
struct EndTapChanger<'t> {
    transformer: &'t dyn Identifiable,
    end: u8,
    kind: TapChangerKind<'t>,
}

impl<'t> EndTapChanger<'t> {
    /// Returns the tap changers attached to one transformer end.
    fn of_end(
        transformer: &'t dyn Identifiable,
        end: u8,
        ratio_tap_changer: Option<&'t RatioTapChanger>,
        phase_tap_changer: Option<&'t PhaseTapChanger>,
    ) -> impl Iterator<Item = Self> {
        ratio_tap_changer
            .map(TapChangerKind::Ratio)
            .into_iter()
            .chain(phase_tap_changer.map(TapChangerKind::Phase))
            .map(move |kind| EndTapChanger {
                transformer,
                end,
                kind,
            })
    }
}

/// Returns all the tap changers of the network, transformer by transformer.
///
/// The tap changers of a two-winding transformer are attached to the end of
/// its first side.
fn tap_changers<'a>(ctx: &ExportContext<'a>) -> Result<Vec<EndTapChanger<'a>>, Error> {
    let network = ctx.network();
    let mut tap_changers = vec![];
    for transformer in &network.two_windings_transformers {
        let end = ctx.two_windings_end_numbers(transformer)?.end_number(1)?;
        tap_changers.extend(EndTapChanger::of_end(
            transformer,
            end,
            transformer.ratio_tap_changer.as_ref(),
            transformer.phase_tap_changer.as_ref(),
        ));
    }
    for transformer in &network.three_windings_transformers {
        let end_numbers = ctx.three_windings_end_numbers(transformer)?;
        for (side, leg) in (1..).zip(&transformer.legs) {
            tap_changers.extend(EndTapChanger::of_end(
                transformer,
                end_numbers.end_number(side)?,
                leg.ratio_tap_changer.as_ref(),
                leg.phase_tap_changer.as_ref(),
            ));
        }
    }
    Ok(tap_changers)
}

/// Writes one document of a session.
///
/// The methods that write each document are defined in the submodules.
struct Emitter<'a, 'w> {
    ctx: &'w mut ExportContext<'a>,
    writer: &'w mut dyn DocumentWriter,
    profile: Profile,
}

impl Emitter<'_, '_> {
    fn write_document(&mut self) -> Result<(), Error> {
        let network_id = self.ctx.network().id.as_str();
        self.writer.start_document(self.profile, network_id)?;
        match self.profile {
            Profile::Equipment => self.write_equipment()?,
            Profile::Topology => self.write_topology()?,
            Profile::SteadyStateHypothesis => self.write_steady_state()?,
            Profile::StateVariables => self.write_state_variables()?,
        }
        let written = self.ctx.written();
        tracing::debug!(
            "{}: wrote {} base voltages, {} regulating controls and {} limit types.",
            self.profile,
            written.count(self.profile, SharedObject::BaseVoltage),
            written.count(self.profile, SharedObject::RegulatingControl),
            written.count(self.profile, SharedObject::OperationalLimitType),
        );
        self.writer.end_document()
    }

    fn cgmes_id(&mut self, object: &dyn Identifiable) -> Result<String, Error> {
        self.ctx.naming_mut().cgmes_id(object)
    }

    fn cgmes_id_for_str(&mut self, key: &str) -> Result<String, Error> {
        self.ctx.naming_mut().cgmes_id_for_str(key)
    }

    fn derived_id(&mut self, key: &str) -> Result<String, Error> {
        self.ctx.naming_mut().derived_id(key)
    }

    fn terminal_id(&self, equipment_id: &str, side: u8) -> Result<String, Error> {
        self.ctx
            .exported_terminal_id(&TerminalRef::new(equipment_id, side))
            .map(str::to_string)
    }

    /// Returns the terminal a regulating control measures at: the regulating
    /// terminal when there is one, or the equipment's own terminal.
    ///
    /// Fails if the regulating terminal has not been exported.
    fn regulated_terminal_id(
        &self,
        equipment: &dyn Identifiable,
        regulating_terminal: Option<&TerminalRef>,
    ) -> Result<String, Error> {
        match regulating_terminal {
            Some(terminal) => self.ctx.exported_terminal_id(terminal).map(str::to_string),
            None => self.terminal_id(equipment.id(), 1),
        }
    }

    /// Returns the identifier of the regulating control of an injection, if
    /// it has one.
    fn regulating_control_id(
        &mut self,
        equipment: &dyn Identifiable,
        regulating: bool,
    ) -> Result<Option<String>, Error> {
        if !has_regulating_control(equipment, regulating) {
            return Ok(None);
        }
        self.ctx
            .naming_mut()
            .cgmes_id_from_property(equipment, REGULATING_CONTROL)
            .map(Some)
    }

    fn tap_changer_id(&mut self, tap_changer: &EndTapChanger) -> Result<String, Error> {
        let alias_type = match tap_changer.kind {
            TapChangerKind::Ratio(_) => AliasType::RatioTapChanger(tap_changer.end),
            TapChangerKind::Phase(_) => AliasType::PhaseTapChanger(tap_changer.end),
        };
        self.ctx
            .naming_mut()
            .cgmes_id_from_alias(tap_changer.transformer, alias_type)
    }

    /// Returns the identifier of the control of a tap changer, if it has one.
    ///
    /// Phase tap changers with a fixed tap have no control.
    fn tap_changer_control_id(
        &mut self,
        tap_changer: &EndTapChanger,
    ) -> Result<Option<String>, Error> {
        let control_id = match tap_changer.kind {
            TapChangerKind::Ratio(t) => t.regulating_control_id.as_deref(),
            TapChangerKind::Phase(t) if t.regulation_mode != PhaseRegulationMode::FixedTap => {
                t.regulating_control_id.as_deref()
            }
            TapChangerKind::Phase(_) => None,
        };
        control_id.map(|id| self.cgmes_id_for_str(id)).transpose()
    }

    /// Returns the identifiers of the equivalent injection at the boundary
    /// side of a dangling line, and of its terminal.
    fn equivalent_injection_ids(
        &mut self,
        dangling_line: &DanglingLine,
    ) -> Result<(String, String), Error> {
        let naming = self.ctx.naming_mut();
        Ok((
            naming.cgmes_id_from_alias(dangling_line, AliasType::EquivalentInjection)?,
            naming.cgmes_id_from_alias(dangling_line, AliasType::EquivalentInjectionTerminal)?,
        ))
    }

    /// Marks a shared object as written to the current document, and returns
    /// true the first time.
    fn first_write(&mut self, kind: SharedObject, id: &str) -> bool {
        self.ctx.mark_written(self.profile, kind, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::NetworkBuilder;
    use crate::{AliasType, IdKind, RecordingSink};

    fn network() -> Network {
        let mut builder = NetworkBuilder::new("N");
        let vl1 = builder.node_breaker_vl("S1", "VL1", 400.0);
        let vl2 = builder.node_breaker_vl("S1", "VL2", 110.0);
        builder.busbar_section("BBS1", vl1, 0);
        builder.switch("BK1", vl1, 0, 1, false);
        builder.generator("G1", vl1, 1);
        builder.two_windings_transformer("TR1", (vl1, 0), (vl2, 0));
        builder.load("LD1", vl2, 0);
        builder.dangling_line("DL1", vl2, 0);
        builder.build()
    }

    #[test]
    fn test_export_all_profiles() -> Result<(), Error> {
        let network = network();
        let mut sink = RecordingSink::new();
        let mapping = export_network(&network, &ExportConfig::default(), &mut sink)?;

        assert_eq!(sink.profiles().collect::<Vec<_>>(), Profile::ALL.to_vec());
        for profile in Profile::ALL {
            let document = sink.document(profile).unwrap();
            assert!(document.complete);
            assert_eq!(document.network_id, "N");
        }
        assert_eq!(mapping.external_id(IdKind::Object, "G1"), Some("G1"));
        assert!(mapping
            .external_id(IdKind::Alias, "DL1_Terminal_Boundary")
            .is_some());
        Ok(())
    }

    #[test]
    fn test_identifiers_shared_by_documents() -> Result<(), Error> {
        let network = network();
        let mut sink = RecordingSink::new();
        export_network(&network, &ExportConfig::default(), &mut sink)?;

        let eq = sink.document(Profile::Equipment).unwrap();
        let tp = sink.document(Profile::Topology).unwrap();
        let ssh = sink.document(Profile::SteadyStateHypothesis).unwrap();

        let terminals = eq.elements_of("Terminal").map(|e| &e.id).collect::<Vec<_>>();
        let tp_terminals = tp.elements_of("Terminal").map(|e| &e.id).collect::<Vec<_>>();
        let ssh_terminals = ssh.elements_of("Terminal").map(|e| &e.id).collect::<Vec<_>>();
        assert_eq!(terminals, tp_terminals);
        assert_eq!(terminals, ssh_terminals);
        assert!(tp.elements_of("Terminal").all(|e| e.about));
        Ok(())
    }

    #[test]
    fn test_round_trip_stability() -> Result<(), Error> {
        let network = network();
        let config = ExportConfig::default();

        let mut first = RecordingSink::new();
        let first_mapping = export_network(&network, &config, &mut first)?;
        let mut second = RecordingSink::new();
        let second_mapping = export_network(&network, &config, &mut second)?;

        assert_eq!(first_mapping, second_mapping);
        for profile in Profile::ALL {
            assert_eq!(first.document(profile), second.document(profile));
        }
        Ok(())
    }

    #[test]
    fn test_fixed_naming_round_trip() -> Result<(), Error> {
        let network = network();
        let config = ExportConfig {
            naming_strategy: crate::NamingStrategyKind::Fixed,
            id_generation: crate::IdGenerationPolicy::Random,
            ..Default::default()
        };

        let mut first = RecordingSink::new();
        let mapping = export_network(&network, &config, &mut first)?;

        let naming = NamingStrategy::fixed(&config, &network, mapping.clone())?;
        let mut second = RecordingSink::new();
        assert_eq!(export_network_with(naming, &network, &config, &mut second)?, mapping);
        assert_eq!(
            first.document(Profile::Equipment),
            second.document(Profile::Equipment)
        );
        Ok(())
    }

    #[test]
    fn test_selected_profiles() -> Result<(), Error> {
        let network = network();
        let config = ExportConfig::default().with_profiles("EQ,SSH")?;
        let mut sink = RecordingSink::new();
        export_network(&network, &config, &mut sink)?;

        assert_eq!(
            sink.profiles().collect::<Vec<_>>(),
            vec![Profile::Equipment, Profile::SteadyStateHypothesis]
        );
        Ok(())
    }

    #[test]
    fn test_preserved_aliases() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl = builder.node_breaker_vl("S1", "VL1", 400.0);
        builder.load("LD1", vl, 1);
        builder.alias("LD1", AliasType::Terminal(1), "_LD1_T1");
        let network = builder.build();

        let mut sink = RecordingSink::new();
        export_network(&network, &ExportConfig::default(), &mut sink)?;
        let eq = sink.document(Profile::Equipment).unwrap();
        let terminal = eq.element("_LD1_T1").unwrap();
        assert_eq!(terminal.reference("Terminal.ConductingEquipment"), Some("LD1"));
        Ok(())
    }

    #[test]
    fn test_encoded_identifier_already_taken() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl = builder.node_breaker_vl("S1", "VL1", 400.0);
        builder.load("1LD", vl, 1);
        builder.load("_1LD", vl, 2);
        let network = builder.build();

        let mut sink = RecordingSink::new();
        let mapping = export_network(&network, &ExportConfig::default(), &mut sink)?;
        let first = mapping.external_id(IdKind::Object, "1LD").unwrap();
        let second = mapping.external_id(IdKind::Object, "_1LD").unwrap();
        assert_eq!(first, "_1LD");
        assert_ne!(first, second);

        let eq = sink.document(Profile::Equipment).unwrap();
        assert_eq!(eq.elements_of("EnergyConsumer").count(), 2);
        assert_eq!(eq.element(second).unwrap().name(), Some("_1LD"));
        Ok(())
    }
}
