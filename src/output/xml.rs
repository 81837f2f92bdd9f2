use std::io::Write;

use anyhow::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::schedule::{RouteStop, StopFacility, TransitLine, TransitRoute, TransitSchedule, Vehicles, format_time};

const SCHEDULE_DOCTYPE: &str =
    r#"transitSchedule SYSTEM "http://www.matsim.org/files/dtd/transitSchedule_v2.dtd""#;
const VEHICLES_NS: &str = "http://www.matsim.org/files/dtd";
const VEHICLES_SCHEMA: &str =
    "http://www.matsim.org/files/dtd http://www.matsim.org/files/dtd/vehicleDefinitions_v2.0.xsd";

fn start<W: Write>(writer: &mut Writer<W>, element: BytesStart) -> Result<()> {
    writer.write_event(Event::Start(element))?;
    Ok(())
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn empty<W: Write>(writer: &mut Writer<W>, element: BytesStart) -> Result<()> {
    writer.write_event(Event::Empty(element))?;
    Ok(())
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    start(writer, BytesStart::new(name))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    end(writer, name)
}

/// Writes `schedule` as a MATSim transitSchedule v2 document.
pub fn write_schedule_xml<W: Write>(schedule: &TransitSchedule, out: W) -> Result<()> {
    let mut writer = Writer::new_with_indent(out, b'\t', 1);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::DocType(BytesText::from_escaped(SCHEDULE_DOCTYPE)))?;
    start(&mut writer, BytesStart::new("transitSchedule"))?;

    start(&mut writer, BytesStart::new("transitStops"))?;
    for facility in schedule.stop_facilities.values() {
        write_stop_facility(&mut writer, facility)?;
    }
    end(&mut writer, "transitStops")?;

    for line in schedule.lines.values() {
        write_line(&mut writer, line)?;
    }

    end(&mut writer, "transitSchedule")?;
    writer.into_inner().flush()?;
    Ok(())
}

fn write_stop_facility<W: Write>(writer: &mut Writer<W>, facility: &StopFacility) -> Result<()> {
    let x = facility.coord.x.to_string();
    let y = facility.coord.y.to_string();
    let mut element = BytesStart::new("stopFacility");
    element.push_attribute(("id", facility.id.as_str()));
    element.push_attribute(("x", x.as_str()));
    element.push_attribute(("y", y.as_str()));
    if let Some(name) = &facility.name {
        element.push_attribute(("name", name.as_str()));
    }
    element.push_attribute(("isBlocking", "false"));
    empty(writer, element)
}

fn write_line<W: Write>(writer: &mut Writer<W>, line: &TransitLine) -> Result<()> {
    let mut element = BytesStart::new("transitLine");
    element.push_attribute(("id", line.id.as_str()));
    if let Some(name) = &line.name {
        element.push_attribute(("name", name.as_str()));
    }
    start(writer, element)?;
    for route in line.routes.values() {
        write_route(writer, route)?;
    }
    end(writer, "transitLine")
}

fn write_route<W: Write>(writer: &mut Writer<W>, route: &TransitRoute) -> Result<()> {
    let mut element = BytesStart::new("transitRoute");
    element.push_attribute(("id", route.id.as_str()));
    start(writer, element)?;
    text_element(writer, "transportMode", route.mode.as_str())?;

    start(writer, BytesStart::new("routeProfile"))?;
    for stop in &route.stops {
        write_route_stop(writer, stop)?;
    }
    end(writer, "routeProfile")?;

    start(writer, BytesStart::new("departures"))?;
    for departure in &route.departures {
        let time = format_time(departure.time);
        let mut element = BytesStart::new("departure");
        element.push_attribute(("id", departure.id.as_str()));
        element.push_attribute(("departureTime", time.as_str()));
        if let Some(vehicle_id) = &departure.vehicle_id {
            element.push_attribute(("vehicleRefId", vehicle_id.as_str()));
        }
        empty(writer, element)?;
    }
    end(writer, "departures")?;

    end(writer, "transitRoute")
}

fn write_route_stop<W: Write>(writer: &mut Writer<W>, stop: &RouteStop) -> Result<()> {
    let mut element = BytesStart::new("stop");
    element.push_attribute(("refId", stop.stop_facility_id.as_str()));
    if let Some(offset) = stop.arrival_offset {
        element.push_attribute(("arrivalOffset", format_time(offset).as_str()));
    }
    if let Some(offset) = stop.departure_offset {
        element.push_attribute(("departureOffset", format_time(offset).as_str()));
    }
    element.push_attribute(("awaitDeparture", if stop.await_departure { "true" } else { "false" }));
    empty(writer, element)
}

/// Writes `vehicles` as a MATSim vehicleDefinitions v2.0 document.
pub fn write_vehicles_xml<W: Write>(vehicles: &Vehicles, out: W) -> Result<()> {
    let mut writer = Writer::new_with_indent(out, b'\t', 1);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("vehicleDefinitions");
    root.push_attribute(("xmlns", VEHICLES_NS));
    root.push_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"));
    root.push_attribute(("xsi:schemaLocation", VEHICLES_SCHEMA));
    start(&mut writer, root)?;

    for vehicle_type in vehicles.types.values() {
        let spec = &vehicle_type.spec;
        let mut element = BytesStart::new("vehicleType");
        element.push_attribute(("id", vehicle_type.id.as_str()));
        start(&mut writer, element)?;

        let seats = spec.seats.to_string();
        let standing = spec.standing_room.to_string();
        let length = spec.length.to_string();
        let width = spec.width.to_string();
        let pce = spec.pce.to_string();
        empty(
            &mut writer,
            BytesStart::new("capacity").with_attributes([
                ("seats", seats.as_str()),
                ("standingRoomInPersons", standing.as_str()),
            ]),
        )?;
        empty(&mut writer, BytesStart::new("length").with_attributes([("meter", length.as_str())]))?;
        empty(&mut writer, BytesStart::new("width").with_attributes([("meter", width.as_str())]))?;
        empty(
            &mut writer,
            BytesStart::new("passengerCarEquivalents").with_attributes([("pce", pce.as_str())]),
        )?;
        empty(
            &mut writer,
            BytesStart::new("networkMode")
                .with_attributes([("networkMode", spec.network_mode.as_str())]),
        )?;

        end(&mut writer, "vehicleType")?;
    }

    for vehicle in &vehicles.vehicles {
        empty(
            &mut writer,
            BytesStart::new("vehicle")
                .with_attributes([("id", vehicle.id.as_str()), ("type", vehicle.type_id.as_str())]),
        )?;
    }

    end(&mut writer, "vehicleDefinitions")?;
    writer.into_inner().flush()?;
    Ok(())
}
