/// Test fixtures: representative upstream payloads.
///
/// These are trimmed copies of what the three upstreams actually send,
/// kept just large enough to exercise the extractors.
///
/// Narvesen store page shape:
///   <ul class="store-list">
///     <li data-lat=".." data-lng=".." data-title=".." data-id="..">
///       <div class="street-address">..</div>   (optional)
///       <span class="locality">..</span>        (optional)
///     </li>
///
/// NGU GetFeatureInfo (msGMLOutput) shape:
///   <msGMLOutput>
///     <{Layer}_layer>
///       <{Layer}_feature>
///         <gml:boundedBy>..</gml:boundedBy>
///         <field>text</field> ...
///       </{Layer}_feature>
///     </{Layer}_layer>
///   </msGMLOutput>

/// Three stores: full record, record without address/locality, and a
/// record whose name and address carry HTML entities.
#[cfg(test)]
pub(crate) fn fixture_store_page_html() -> &'static str {
    r#"<!DOCTYPE html>
<html lang="no">
<head><title>Finn butikk | Narvesen</title></head>
<body>
  <div class="store-finder">
    <ul class="store-list">
      <li data-lat="59.9111" data-lng="10.7503" data-title="Narvesen Oslo S" data-id="101">
        <h3>Narvesen Oslo S</h3>
        <div class="adr">
          <div class="street-address">Jernbanetorget 1</div>
          <span class="postal-code">0154</span> <span class="locality">Oslo</span>
        </div>
      </li>
      <li data-lat="60.3904" data-lng="5.3331" data-title="  Narvesen Bergen Stasjon  " data-id="102">
        <h3>Narvesen Bergen Stasjon</h3>
      </li>
      <li data-lat="69.6489" data-lng="18.9551" data-title="Narvesen Troms&#248;" data-id="103">
        <div class="street-address"> Storgata 1 &amp; 3 </div>
        <span class="locality">Tromsø</span>
      </li>
    </ul>
  </div>
</body>
</html>"#
}

/// Middle block has a non-numeric latitude and must be dropped.
#[cfg(test)]
pub(crate) fn fixture_store_page_with_bad_coordinates_html() -> &'static str {
    r#"<ul class="store-list">
      <li data-lat="61.1153" data-lng="10.4662" data-title="Narvesen Før">
        <span class="locality">Lillehammer</span>
      </li>
      <li data-lat="n/a" data-lng="10.9" data-title="Narvesen Ødelagt">
        <span class="locality">Gjøvik</span>
      </li>
      <li data-lat="60.7945" data-lng="11.0680" data-title="Narvesen Etter">
        <span class="locality">Hamar</span>
      </li>
    </ul>"#
}

/// A page after a markup change: same stores, attributes renamed.
#[cfg(test)]
pub(crate) fn fixture_redesigned_store_page_html() -> &'static str {
    r#"<div class="stores">
      <article data-latitude="59.9111" data-longitude="10.7503" data-name="Narvesen Oslo S">
        <p class="address">Jernbanetorget 1, Oslo</p>
      </article>
    </div>"#
}

/// Bedrock layer, one feature with three fields.
#[cfg(test)]
pub(crate) fn fixture_bedrock_gml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<msGMLOutput xmlns:gml="http://www.opengis.net/gml" xmlns:xlink="http://www.w3.org/1999/xlink">
	<Berggrunn_sammenstilt_hovedbergarter_lokal_layer>
	<gml:name>Berggrunn sammenstilt hovedbergarter</gml:name>
		<Berggrunn_sammenstilt_hovedbergarter_lokal_feature>
			<bergartsenhet_tekst>Leirskifer, svart</bergartsenhet_tekst>
			<hovedbergart_tekst>Leirskifer</hovedbergart_tekst>
			<tektoniskhovedinndeling_tekst>Kaledonsk orogen</tektoniskhovedinndeling_tekst>
		</Berggrunn_sammenstilt_hovedbergarter_lokal_feature>
	</Berggrunn_sammenstilt_hovedbergarter_lokal_layer>
</msGMLOutput>"#
}

/// Sediment layer with a `gml:boundedBy` block ahead of the fields.
#[cfg(test)]
pub(crate) fn fixture_sediment_gml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<msGMLOutput xmlns:gml="http://www.opengis.net/gml">
	<Losmasser_nasjonal_hovedlosmassetyper_layer>
		<Losmasser_nasjonal_hovedlosmassetyper_feature>
			<gml:boundedBy>
				<gml:Box srsName="EPSG:4326">
					<gml:coordinates>10.740000,59.900000 10.760000,59.920000</gml:coordinates>
				</gml:Box>
			</gml:boundedBy>
			<losmassetype_navn>Bart fjell</losmassetype_navn>
			<losmassetype_besk>Fjell med tynt løsmassedekke</losmassetype_besk>
		</Losmasser_nasjonal_hovedlosmassetyper_feature>
	</Losmasser_nasjonal_hovedlosmassetyper_layer>
</msGMLOutput>"#
}

/// A point with no data: the layer element is present, no feature.
#[cfg(test)]
pub(crate) fn fixture_empty_gml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<msGMLOutput xmlns:gml="http://www.opengis.net/gml">
</msGMLOutput>"#
}

/// Two sibling features; only the first may be returned.
#[cfg(test)]
pub(crate) fn fixture_two_features_gml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<msGMLOutput xmlns:gml="http://www.opengis.net/gml">
	<Test_layer>
		<Test_feature>
			<name>First</name>
		</Test_feature>
		<Test_feature>
			<name>Second</name>
			<only_in_second>leak</only_in_second>
		</Test_feature>
	</Test_layer>
</msGMLOutput>"#
}
